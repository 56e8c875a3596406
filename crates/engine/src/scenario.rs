//! Scenario projection: human vs. AI support.
//!
//! Both scenarios run the same arithmetic over the same [`MetricsInput`]; they
//! differ only in the contact-loss rate and the conversion-rate multiplier.
//! The operation order below is fixed so results match the reference figures
//! bit for bit.
//!
//! Lost revenue always uses the base conversion rate, even for the AI
//! scenario. The uplift is deliberately not applied there.

use serde::{Deserialize, Serialize};

use crate::currency::format_brl;
use crate::metrics::MetricsInput;

/// Days per projected month.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Fraction of contacts lost before a human responds.
pub const HUMAN_LOST_LEADS_RATE: f64 = 0.30;

/// Fraction of contacts lost before the AI responds.
pub const AI_LOST_LEADS_RATE: f64 = 0.05;

/// Conversion-rate multiplier assumed for AI support (50% uplift).
pub const AI_CONVERSION_UPLIFT: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Human,
    Ai,
}

impl Scenario {
    pub fn from_is_ai(is_ai: bool) -> Self {
        if is_ai { Scenario::Ai } else { Scenario::Human }
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Scenario::Ai)
    }

    pub fn lost_leads_rate(&self) -> f64 {
        match self {
            Scenario::Human => HUMAN_LOST_LEADS_RATE,
            Scenario::Ai => AI_LOST_LEADS_RATE,
        }
    }

    /// Conversion rate (percent) this scenario applies to responded contacts.
    pub fn effective_conversion_rate(&self, base_percent: f64) -> f64 {
        match self {
            Scenario::Human => base_percent,
            Scenario::Ai => base_percent * AI_CONVERSION_UPLIFT,
        }
    }

    /// Panel title.
    pub fn title(&self) -> &'static str {
        match self {
            Scenario::Human => "Atendimento Humano",
            Scenario::Ai => "Atendimento IA",
        }
    }
}

/// Unrounded, unformatted projection. Locale-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFigures {
    pub monthly_contacts: f64,
    pub responded_contacts: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub lost_revenue: f64,
}

impl ScenarioFigures {
    pub fn compute(input: &MetricsInput, scenario: Scenario) -> Self {
        let monthly_contacts = input.contacts_per_day * DAYS_PER_MONTH;
        let lost_leads_rate = scenario.lost_leads_rate();
        let responded_contacts = monthly_contacts * (1.0 - lost_leads_rate);
        let conversions = (responded_contacts
            * scenario.effective_conversion_rate(input.conversion_rate_percent))
            / 100.0;
        let revenue = conversions * input.average_ticket_value;
        let lost_revenue = monthly_contacts
            * lost_leads_rate
            * (input.conversion_rate_percent / 100.0)
            * input.average_ticket_value;

        Self {
            monthly_contacts,
            responded_contacts,
            conversions,
            revenue,
            lost_revenue,
        }
    }
}

/// What one output panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub responded_contacts: i64,
    pub conversions: i64,
    pub revenue: String,
    pub lost_revenue: String,
}

impl From<ScenarioFigures> for ScenarioResult {
    fn from(figures: ScenarioFigures) -> Self {
        Self {
            responded_contacts: round_count(figures.responded_contacts),
            conversions: round_count(figures.conversions),
            revenue: format_brl(figures.revenue),
            lost_revenue: format_brl(figures.lost_revenue),
        }
    }
}

/// Project one scenario.
pub fn project(input: &MetricsInput, scenario: Scenario) -> ScenarioResult {
    ScenarioFigures::compute(input, scenario).into()
}

/// Round half away from zero. Non-finite counts saturate (NaN → 0).
fn round_count(value: f64) -> i64 {
    value.round() as i64
}

/// Both panels for one input snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub human: ScenarioResult,
    pub ai: ScenarioResult,
}

impl Comparison {
    pub fn compute(input: &MetricsInput) -> Self {
        Self {
            human: project(input, Scenario::Human),
            ai: project(input, Scenario::Ai),
        }
    }

    pub fn get(&self, scenario: Scenario) -> &ScenarioResult {
        match scenario {
            Scenario::Human => &self.human,
            Scenario::Ai => &self.ai,
        }
    }
}
