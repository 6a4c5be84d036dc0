//! Canned "AI" advisor. There is no model behind it: replies come from
//! keyword-matched templates and carbon numbers are random draws, so every reply
//! is flagged `simulated`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Personality {
    EcoCoach,
    CryptoAnalyst,
    PunkHacker,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdvisorReply {
    pub text: String,
    pub personality: Personality,
    pub carbon_impact_kg: u32,
    pub simulated: bool,
}

pub struct Advisor<R: Rng = StdRng> {
    rng: R,
    total_carbon_saved_kg: u64,
}

impl Advisor<StdRng> {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Advisor<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng, total_carbon_saved_kg: 0 }
    }

    pub fn total_carbon_saved_kg(&self) -> u64 {
        self.total_carbon_saved_kg
    }

    pub fn respond(&mut self, message: &str, personality: Personality) -> AdvisorReply {
        let msg = message.to_lowercase();
        let variant = self.rng.gen_range(0..2);
        let text = template(personality, variant, &msg);
        let carbon_impact_kg = self.rng.gen_range(10..60);
        self.total_carbon_saved_kg += u64::from(carbon_impact_kg);
        AdvisorReply {
            text,
            personality,
            carbon_impact_kg,
            simulated: true,
        }
    }
}

/// First branch whose `|`-separated keywords appear in `msg`.
fn pick<'a>(msg: &str, branches: &[(&str, &'a str)], default: &'a str) -> &'a str {
    branches
        .iter()
        .find(|(keys, _)| keys.split('|').any(|k| msg.contains(k)))
        .map(|(_, text)| *text)
        .unwrap_or(default)
}

fn template(personality: Personality, variant: u32, msg: &str) -> String {
    match (personality, variant) {
        (Personality::EcoCoach, 0) => format!(
            "[ECO_PROTOCOL_ACTIVATED] {} [IMPACT_MULTIPLIER]: your actions inspire the network.",
            pick(
                msg,
                &[
                    ("energy", "Switch to renewable supply and LED lighting. [CARBON_REDUCTION]: -2.3 t CO2/year."),
                    ("waste", "Run the 5Rs: refuse, reduce, reuse, recycle, rot. Zero-waste is reachable."),
                    ("transport", "E-bikes, public transit and remote work. [MOBILITY_EFFICIENCY]: -4.1 t CO2/year."),
                ],
                "Start with diet, consumption and a renewable tariff.",
            )
        ),
        (Personality::EcoCoach, _) => format!(
            "[SUSTAINABILITY_SCAN_COMPLETE] {} [NETWORK_BONUS]: share what works.",
            pick(
                msg,
                &[
                    ("solar", "[SOLAR_PROTOCOL]: panels plus battery storage pay back in 6-8 years."),
                    ("food", "[NUTRITION_OPTIMIZATION]: a plant-based diet cuts emissions sharply."),
                    ("plastic", "[PLASTIC_ELIMINATION]: refill stores and reusable containers."),
                ],
                "Audit your footprint, set targets, act, then measure.",
            )
        ),
        (Personality::CryptoAnalyst, 0) => format!(
            "[MARKET_ANALYSIS_COMPLETE] {} [ALPHA_LEAK]: green regulation is a tailwind.",
            pick(
                msg,
                &[
                    ("green|eco", "[ECO_TOKEN_ALERT]: SOL, post-merge ETH and ADA lead on carbon score."),
                    ("solana|sol", "[SOL_ANALYSIS]: 0.00051 kWh/tx proof-of-stake. Green narrative is long-term bullish."),
                    ("defi", "[DEFI_GREENWASHING_DETECTOR]: look for PoS consensus and transparent energy metrics."),
                ],
                "[PORTFOLIO_OPTIMIZATION]: 60% green L1s, 25% green DeFi, 15% carbon-credit plays.",
            )
        ),
        (Personality::CryptoAnalyst, _) => format!(
            "[TECHNICAL_SCAN_ACTIVATED] {} [PROFIT_PROTOCOL]: align values with gains.",
            pick(
                msg,
                &[
                    ("bitcoin|btc", "[BTC_WARNING]: proof-of-work carries regulatory risk. Consider rotating."),
                    ("nft", "[NFT_EVOLUTION]: PoS-hosted NFT platforms keep the footprint low."),
                    ("dao", "[DAO_REVOLUTION]: environmental governance tokens are trending."),
                ],
                "ESG compliance plus institutional adoption favours eco-tokens.",
            )
        ),
        (Personality::PunkHacker, 0) => format!(
            "[HACK_THE_PLANET_INITIATED] {} [RESISTANCE_ACTIVATED]",
            pick(
                msg,
                &[
                    ("corporate|pollution", "[CORPORATE_DISRUPTION]: build green alternatives and expose carbon lies."),
                    ("government|policy", "[SYSTEM_INFILTRATION]: carbon-tracking DAOs and transparency tools."),
                    ("energy", "[ENERGY_LIBERATION]: solar plus mesh networks means energy independence."),
                ],
                "Build green tech, back eco-hackers, use crypto for climate action.",
            )
        ),
        (Personality::PunkHacker, _) => format!(
            "[GREEN_CYBERPUNK_MODE] {} [PUNK_PROTOCOL]: stay green, keep hacking.",
            pick(
                msg,
                &[
                    ("tech|code", "[CODING_FOR_CLIMATE]: ship apps for carbon tracking and green supply chains."),
                    ("fight|activism", "[DIGITAL_ACTIVISM]: expose greenwashing and amplify the data."),
                    ("future", "[SOLARPUNK_VISION]: decentralised green cities, renewable everything."),
                ],
                "Use blockchain for environmental justice and code for climate action.",
            )
        ),
    }
}
