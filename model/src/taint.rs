//! The canonical taint type and the translation of each provider's native taint encoding.
//!
//! AWS and GCP report the effect as an enumeration, so every native taint decodes to some
//! canonical taint. Azure packs a taint into a single `key=value:Effect` string; strings that do
//! not have that shape are dropped rather than reported.

use serde::{Deserialize, Serialize};
use serde_plain::derive_display_from_serialize;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TaintEffect {
    /// Pods that do not tolerate the taint are not scheduled on the node.
    #[serde(rename = "no-schedule")]
    NoSchedule,
    /// Pods that do not tolerate the taint are evicted from the node.
    #[serde(rename = "no-execute")]
    NoExecute,
    /// The scheduler tries to avoid placing pods that do not tolerate the taint on the node.
    #[serde(rename = "prefer-no-schedule")]
    PreferNoSchedule,
    /// The native effect was not recognized. Documents carrying this value are not valid input
    /// for cluster creation.
    #[serde(rename = "")]
    Unspecified,
}

derive_display_from_serialize!(TaintEffect);

impl TaintEffect {
    /// The spelling used by the Kubernetes API (and by Azure node taint strings).
    pub fn kubernetes_name(&self) -> &'static str {
        match self {
            TaintEffect::NoSchedule => "NoSchedule",
            TaintEffect::NoExecute => "NoExecute",
            TaintEffect::PreferNoSchedule => "PreferNoSchedule",
            TaintEffect::Unspecified => "",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Taint {
    pub effect: TaintEffect,
    pub key: String,
    pub value: String,
}

impl Taint {
    pub fn new<K, V>(key: K, value: V, effect: TaintEffect) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            effect,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.effect != TaintEffect::Unspecified && !self.key.is_empty()
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taints(pub Vec<Taint>);

impl Taints {
    pub fn contains(&self, taint: &Taint) -> bool {
        self.0.iter().any(|t| t == taint)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Taint> {
        self.0.iter()
    }
}

impl FromIterator<Taint> for Taints {
    fn from_iter<T: IntoIterator<Item = Taint>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Maps an EKS taint effect. Anything unrecognized (including a missing effect) falls back to
/// `PreferNoSchedule`.
pub fn effect_from_aws(effect: &str) -> TaintEffect {
    match effect {
        "NO_SCHEDULE" => TaintEffect::NoSchedule,
        "NO_EXECUTE" => TaintEffect::NoExecute,
        _ => TaintEffect::PreferNoSchedule,
    }
}

/// Maps a GKE node taint effect. `EFFECT_UNSPECIFIED` and unknown values become `Unspecified`.
pub fn effect_from_gcp(effect: &str) -> TaintEffect {
    match effect {
        "NO_SCHEDULE" => TaintEffect::NoSchedule,
        "NO_EXECUTE" => TaintEffect::NoExecute,
        "PREFER_NO_SCHEDULE" => TaintEffect::PreferNoSchedule,
        _ => TaintEffect::Unspecified,
    }
}

/// Maps the effect segment of an Azure taint string, ignoring case.
pub fn effect_from_azure(effect: &str) -> TaintEffect {
    [
        TaintEffect::NoSchedule,
        TaintEffect::NoExecute,
        TaintEffect::PreferNoSchedule,
    ]
    .into_iter()
    .find(|candidate| candidate.kubernetes_name().eq_ignore_ascii_case(effect.trim()))
    .unwrap_or(TaintEffect::Unspecified)
}

/// Decodes a single `key=value:Effect` string. The effect is split off at the last `:` and the
/// remainder is split once at the first `=`.
pub fn decode_azure_taint(taint: &str) -> Option<Taint> {
    let (key_value, effect) = taint.rsplit_once(':')?;
    let (key, value) = key_value.split_once('=')?;
    Some(Taint::new(key, value, effect_from_azure(effect)))
}

/// Decodes every well-formed Azure taint string, dropping the rest.
pub fn decode_azure_taints<I, S>(taints: I) -> Taints
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    taints
        .into_iter()
        .filter_map(|taint| {
            let decoded = decode_azure_taint(taint.as_ref());
            if decoded.is_none() {
                log::debug!("Dropping malformed node taint '{}'", taint.as_ref());
            }
            decoded
        })
        .collect()
}

pub fn encode_azure_taint(taint: &Taint) -> String {
    format!(
        "{}={}:{}",
        taint.key,
        taint.value,
        taint.effect.kubernetes_name()
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn azure_taint_round_trip() {
        let taints = [
            Taint::new("dedicated", "gpu", TaintEffect::NoSchedule),
            Taint::new("example.com/maintenance", "", TaintEffect::NoExecute),
            Taint::new("spot", "true", TaintEffect::PreferNoSchedule),
        ];
        for taint in taints {
            let encoded = encode_azure_taint(&taint);
            assert_eq!(decode_azure_taint(&encoded), Some(taint));
        }
    }

    #[test]
    fn azure_effect_is_split_at_last_colon() {
        let taint = decode_azure_taint("url=https://example.com:NoSchedule").unwrap();
        assert_eq!(taint.key, "url");
        assert_eq!(taint.value, "https://example.com");
        assert_eq!(taint.effect, TaintEffect::NoSchedule);

        let taint = decode_azure_taint("a=b=c:noexecute").unwrap();
        assert_eq!(taint.key, "a");
        assert_eq!(taint.value, "b=c");
        assert_eq!(taint.effect, TaintEffect::NoExecute);
    }

    #[test]
    fn malformed_azure_taints_are_dropped() {
        let decoded =
            decode_azure_taints(["no-colon=value", "key:NoSchedule", "", "k=v:NoSchedule"]);
        assert_eq!(
            decoded,
            Taints(vec![Taint::new("k", "v", TaintEffect::NoSchedule)])
        );
        assert!(decode_azure_taints(["garbage"]).is_empty());
    }

    #[test]
    fn unknown_effects() {
        assert_eq!(effect_from_aws("SOMETHING_NEW"), TaintEffect::PreferNoSchedule);
        assert_eq!(effect_from_aws("NO_EXECUTE"), TaintEffect::NoExecute);
        assert_eq!(effect_from_gcp("EFFECT_UNSPECIFIED"), TaintEffect::Unspecified);

        let taint = decode_azure_taint("k=v:Sometimes").unwrap();
        assert_eq!(taint.effect, TaintEffect::Unspecified);
        assert!(!taint.is_valid());
        assert_eq!(taint.effect.to_string(), "");
    }

    #[test]
    fn taint_equality_is_structural() {
        let taints = Taints(vec![
            Taint::new("a", "1", TaintEffect::NoSchedule),
            Taint::new("b", "2", TaintEffect::NoExecute),
        ]);
        assert!(taints.contains(&Taint::new("b", "2", TaintEffect::NoExecute)));
        assert!(!taints.contains(&Taint::new("b", "2", TaintEffect::NoSchedule)));
        assert!(!taints.contains(&Taint::new("a", "2", TaintEffect::NoSchedule)));
    }
}
