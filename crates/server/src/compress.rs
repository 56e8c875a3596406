//! Response compression (gzip / deflate).

use std::io::Write;

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gzip,
    Deflate,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
        }
    }
}

/// Pick an encoding from an `Accept-Encoding` value. gzip wins ties; `*`
/// counts as gzip; anything with `q=0` is refused.
pub fn negotiate(accept_encoding: &str) -> Option<Encoding> {
    let mut gzip_q: Option<f32> = None;
    let mut deflate_q: Option<f32> = None;
    let mut star_q: Option<f32> = None;

    for item in accept_encoding.split(',') {
        let mut parts = item.split(';');
        let coding = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let q = parts
            .filter_map(|p| {
                let (k, v) = p.split_once('=')?;
                if k.trim().eq_ignore_ascii_case("q") {
                    v.trim().parse::<f32>().ok()
                } else {
                    None
                }
            })
            .next()
            .unwrap_or(1.0);

        match coding.as_str() {
            "gzip" | "x-gzip" => gzip_q = Some(q),
            "deflate" => deflate_q = Some(q),
            "*" => star_q = Some(q),
            _ => {}
        }
    }

    let gzip = gzip_q.or(star_q).unwrap_or(0.0);
    let deflate = deflate_q.unwrap_or(0.0);

    if gzip > 0.0 && gzip >= deflate {
        Some(Encoding::Gzip)
    } else if deflate > 0.0 {
        Some(Encoding::Deflate)
    } else {
        None
    }
}

/// Compress `body` with the given encoding at the default level.
pub fn compress(body: &[u8], encoding: Encoding) -> std::io::Result<Vec<u8>> {
    match encoding {
        Encoding::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(body)?;
            enc.finish()
        }
        Encoding::Deflate => {
            let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
            enc.write_all(body)?;
            enc.finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::{GzDecoder, ZlibDecoder};
    use std::io::Read;

    #[test]
    fn test_negotiate_prefers_gzip() {
        assert_eq!(negotiate("gzip, deflate, br"), Some(Encoding::Gzip));
        assert_eq!(negotiate("deflate, gzip"), Some(Encoding::Gzip));
        assert_eq!(negotiate("deflate"), Some(Encoding::Deflate));
        assert_eq!(negotiate("*"), Some(Encoding::Gzip));
    }

    #[test]
    fn test_negotiate_quality_values() {
        assert_eq!(negotiate("gzip;q=0, deflate"), Some(Encoding::Deflate));
        assert_eq!(negotiate("gzip;q=0.2, deflate;q=0.8"), Some(Encoding::Deflate));
        assert_eq!(negotiate("gzip;q=0, deflate;q=0"), None);
        assert_eq!(negotiate("*;q=0"), None);
    }

    #[test]
    fn test_negotiate_nothing_usable() {
        assert_eq!(negotiate(""), None);
        assert_eq!(negotiate("identity"), None);
        assert_eq!(negotiate("br"), None);
    }

    #[test]
    fn test_gzip_compresses() {
        let body = "<html>".repeat(500);
        let gz = compress(body.as_bytes(), Encoding::Gzip).unwrap();
        assert!(gz.len() < body.len());

        let mut out = String::new();
        GzDecoder::new(&gz[..]).read_to_string(&mut out).unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn test_deflate_is_zlib_wrapped() {
        let body = "abc".repeat(1000);
        let z = compress(body.as_bytes(), Encoding::Deflate).unwrap();
        let mut out = String::new();
        ZlibDecoder::new(&z[..]).read_to_string(&mut out).unwrap();
        assert_eq!(out, body);
    }
}
