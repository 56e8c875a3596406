//! Plain-text and JSON rendering of a projection.

use std::io::{self, Write};

use effcalc_engine::metrics::display_value;
use effcalc_engine::{Comparison, MetricsField, MetricsInput, Scenario, ScenarioResult};
use serde::Serialize;

use crate::util;

/// One output row: label plus how to read it from a panel.
pub(crate) struct ResultRow {
    pub label: &'static str,
    pub value: fn(&ScenarioResult) -> String,
}

/// Output rows in panel order.
pub(crate) const RESULT_ROWS: [ResultRow; 4] = [
    ResultRow { label: "Atendimentos/mês", value: |r| r.responded_contacts.to_string() },
    ResultRow { label: "Conversões", value: |r| r.conversions.to_string() },
    ResultRow { label: "Faturamento", value: |r| r.revenue.clone() },
    ResultRow { label: "Perda Mensal", value: |r| r.lost_revenue.clone() },
];

pub(crate) const INPUT_HEADING: &str = "Configurar Métricas";

/// Static footer copied from the web app.
pub(crate) const ADVANTAGES_HEADING: &str = "Vantagens do Atendimento com IA";
pub(crate) const ADVANTAGES: [(&str, &str); 3] = [
    ("Resposta Imediata", "Atendimento em menos de 5 minutos"),
    ("Maior Conversão", "Aumento natural na taxa de agendamentos"),
    ("Redução de Perdas", "Minimização de oportunidades perdidas"),
];

const SCENARIOS: [Scenario; 2] = [Scenario::Human, Scenario::Ai];

/// JSON document printed by `effcalc project --json`.
#[derive(Serialize)]
pub(crate) struct ProjectionOutput<'a> {
    pub input: &'a MetricsInput,
    pub human: &'a ScenarioResult,
    pub ai: &'a ScenarioResult,
}

pub(crate) fn write_json<W: Write>(w: &mut W, input: &MetricsInput, cmp: &Comparison) -> io::Result<()> {
    let doc = ProjectionOutput { input, human: &cmp.human, ai: &cmp.ai };
    let json = serde_json::to_string_pretty(&doc).map_err(io::Error::other)?;
    writeln!(w, "{}", json)
}

/// Input summary followed by the side-by-side comparison table.
pub(crate) fn write_text<W: Write>(w: &mut W, input: &MetricsInput, cmp: &Comparison) -> io::Result<()> {
    let input_width = MetricsField::ALL
        .iter()
        .map(|f| util::display_width(f.label()))
        .max()
        .unwrap_or(0);

    writeln!(w, "{}", INPUT_HEADING)?;
    for field in MetricsField::ALL {
        let raw = display_value(input.get(field));
        let shown = if raw.is_empty() { "NaN".to_string() } else { raw };
        writeln!(w, "  {}  {}", util::pad_right(field.label(), input_width), shown)?;
    }
    writeln!(w)?;

    let label_width = RESULT_ROWS
        .iter()
        .map(|row| util::display_width(row.label))
        .max()
        .unwrap_or(0);
    let col_widths: Vec<usize> = SCENARIOS
        .iter()
        .map(|s| {
            let values = RESULT_ROWS.iter().map(|row| util::display_width(&(row.value)(cmp.get(*s))));
            values.chain(std::iter::once(util::display_width(s.title()))).max().unwrap_or(0)
        })
        .collect();

    write!(w, "{}", " ".repeat(label_width))?;
    for (s, width) in SCENARIOS.iter().zip(&col_widths) {
        write!(w, "  {}", util::pad_left(s.title(), *width))?;
    }
    writeln!(w)?;

    write!(w, "{}", "-".repeat(label_width))?;
    for width in &col_widths {
        write!(w, "  {}", "-".repeat(*width))?;
    }
    writeln!(w)?;

    for row in &RESULT_ROWS {
        write!(w, "{}", util::pad_right(row.label, label_width))?;
        for (s, width) in SCENARIOS.iter().zip(&col_widths) {
            write!(w, "  {}", util::pad_left(&(row.value)(cmp.get(*s)), *width))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_text(input: &MetricsInput) -> String {
        let mut out = Vec::new();
        write_text(&mut out, input, &Comparison::compute(input)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_contains_both_panels() {
        let text = render_text(&MetricsInput::default());
        assert!(text.contains("Atendimento Humano"));
        assert!(text.contains("Atendimento IA"));
        assert!(text.contains("R$\u{a0}50.400,00"));
        assert!(text.contains("R$\u{a0}102.600,00"));
    }

    #[test]
    fn test_text_rows_align() {
        let text = render_text(&MetricsInput::default());
        let table: Vec<&str> = text.lines().skip_while(|l| !l.is_empty()).skip(1).collect();
        let widths: Vec<usize> = table.iter().map(|l| util::display_width(l)).collect();
        assert_eq!(table.len(), 6);
        assert!(widths.iter().all(|w| *w == widths[0]), "widths: {:?}", widths);
    }

    #[test]
    fn test_text_row_values() {
        let text = render_text(&MetricsInput::default());
        let conversions = text.lines().find(|l| l.starts_with("Conversões")).unwrap();
        let cells: Vec<&str> = conversions.split_whitespace().collect();
        assert_eq!(cells, vec!["Conversões", "42", "86"]);
    }

    #[test]
    fn test_nan_input_shown() {
        let input = MetricsInput { average_ticket_value: f64::NAN, ..MetricsInput::default() };
        let text = render_text(&input);
        assert!(text.contains("NaN"));
    }

    #[test]
    fn test_json_document() {
        let input = MetricsInput::default();
        let mut out = Vec::new();
        write_json(&mut out, &input, &Comparison::compute(&input)).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["input"]["contactsPerDay"], 100.0);
        assert_eq!(v["human"]["respondedContacts"], 2100);
        assert_eq!(v["ai"]["revenue"], "R$\u{a0}102.600,00");
    }
}
