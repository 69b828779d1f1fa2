//! Personality trait cards carried as top-level report fields.
//!
//! Each card pairs a text field with a numeric `*Score` field.

use std::collections::BTreeMap;

use super::scalar::ScalarValue;

/// Static description of one trait card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitCard {
    pub key: &'static str,
    pub label: &'static str,
    pub score_key: &'static str,
}

/// Cards in display order.
pub const TRAIT_CARDS: &[TraitCard] = &[
    TraitCard { key: "summary", label: "命理总评", score_key: "summaryScore" },
    TraitCard { key: "personality", label: "性格深层", score_key: "personalityScore" },
    TraitCard { key: "industry", label: "事业走势", score_key: "industryScore" },
    TraitCard { key: "wealth", label: "财富结构", score_key: "wealthScore" },
    TraitCard { key: "marriage", label: "婚姻关系", score_key: "marriageScore" },
    TraitCard { key: "health", label: "健康能量", score_key: "healthScore" },
    TraitCard { key: "family", label: "六亲关系", score_key: "familyScore" },
    TraitCard { key: "fengShui", label: "风水建议", score_key: "fengShuiScore" },
    TraitCard { key: "crypto", label: "交易风格", score_key: "cryptoScore" },
];

/// A card filled from report fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledCard {
    pub card: TraitCard,
    pub text: String,
    pub score: Option<f64>,
}

/// Cards whose text field is present and non-empty, in display order.
pub fn filled_cards(fields: &BTreeMap<String, ScalarValue>) -> Vec<FilledCard> {
    TRAIT_CARDS
        .iter()
        .filter_map(|card| {
            let text = fields.get(card.key)?.to_text();
            if text.trim().is_empty() {
                return None;
            }
            let score = fields
                .get(card.score_key)
                .map(|v| v.to_number())
                .filter(|n| n.is_finite());
            Some(FilledCard {
                card: *card,
                text,
                score,
            })
        })
        .collect()
}
