//! Shareable filter links.
//!
//! The current criteria are encoded as a query string
//! (`types=bus,tram&districts=AB&q=and`) so a filter can travel as a link:
//! the "Copy filter link" button emits it and the second CLI argument reads
//! it back at startup. The filter engine itself only ever sees decoded
//! criteria.

use crate::data::filter::FilterCriteria;

pub const PARAM_TYPES: &str = "types";
pub const PARAM_DISTRICTS: &str = "districts";
pub const PARAM_QUERY: &str = "q";

// ---------------------------------------------------------------------------
// Decoded parameters
// ---------------------------------------------------------------------------

/// Raw decoded parameters, before UI-level defaulting.
///
/// `types: None` means the parameter was absent or empty — the UI then
/// defaults to all known traffic types. That default is deliberately NOT
/// part of [`FilterCriteria`], where an empty set means pass-through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub types: Option<Vec<String>>,
    pub districts: Vec<String>,
    pub q: String,
}

/// Parse a query string. Unknown parameters are ignored; empty list values
/// are skipped, mirroring the original's `[t for t in ... if t]`.
pub fn decode(query: &str) -> QueryParams {
    let mut params = QueryParams::default();

    for pair in query.trim_start_matches('?').split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            PARAM_TYPES => {
                let types = split_list(value);
                if !types.is_empty() {
                    params.types = Some(types);
                }
            }
            PARAM_DISTRICTS => params.districts = split_list(value),
            PARAM_QUERY => params.q = unescape(value),
            _ => {}
        }
    }

    params
}

/// Encode criteria as a shareable query string, comma-joining the list
/// parameters. Values are percent-encoded so user text containing the
/// delimiters (`&`, `=`, `,`) survives the round trip.
pub fn encode(criteria: &FilterCriteria) -> String {
    let types: Vec<String> = criteria.types.iter().map(|t| escape(t)).collect();
    let districts: Vec<String> = criteria.districts.iter().map(|d| escape(d)).collect();
    format!(
        "{PARAM_TYPES}={}&{PARAM_DISTRICTS}={}&{PARAM_QUERY}={}",
        types.join(","),
        districts.join(","),
        escape(&criteria.name_query)
    )
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(unescape)
        .collect()
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for &byte in value.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Reverse of [`escape`]. Malformed escapes pass through literally rather
/// than erroring — a hand-edited link should degrade, not fail.
fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_three_parameters() {
        let params = decode("types=bus,tram&districts=AB,CD&q=karl");
        assert_eq!(
            params.types,
            Some(vec!["bus".to_string(), "tram".to_string()])
        );
        assert_eq!(params.districts, ["AB", "CD"]);
        assert_eq!(params.q, "karl");
    }

    #[test]
    fn absent_or_empty_types_decode_to_none() {
        assert_eq!(decode("districts=AB&q=").types, None);
        assert_eq!(decode("types=&districts=AB").types, None);
        // Stray commas produce no entries either.
        assert_eq!(decode("types=,,").types, None);
    }

    #[test]
    fn leading_question_mark_and_unknown_keys_are_tolerated() {
        let params = decode("?q=and&zoom=12");
        assert_eq!(params.q, "and");
        assert_eq!(params.types, None);
    }

    #[test]
    fn encode_decode_round_trips_criteria() {
        let criteria = FilterCriteria {
            types: ["bus".to_string(), "tram".to_string()].into(),
            districts: ["AB".to_string()].into(),
            name_query: "karl".to_string(),
        };
        let params = decode(&encode(&criteria));
        assert_eq!(
            params.types,
            Some(vec!["bus".to_string(), "tram".to_string()])
        );
        assert_eq!(params.districts, ["AB"]);
        assert_eq!(params.q, "karl");
    }

    #[test]
    fn delimiters_in_values_survive_the_round_trip() {
        let criteria = FilterCriteria {
            types: ["night&weekend".to_string()].into(),
            districts: ["A,B".to_string(), "C=D".to_string()].into(),
            name_query: "a&b=c,d%".to_string(),
        };
        let encoded = encode(&criteria);
        // The raw delimiters may only appear as parameter structure.
        assert_eq!(encoded.matches('&').count(), 2);
        assert_eq!(encoded.matches('=').count(), 3);

        let params = decode(&encoded);
        assert_eq!(params.types, Some(vec!["night&weekend".to_string()]));
        assert_eq!(params.districts, ["A,B", "C=D"]);
        assert_eq!(params.q, "a&b=c,d%");
    }

    #[test]
    fn non_ascii_query_text_round_trips() {
        let criteria = FilterCriteria {
            name_query: "nádraží".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(decode(&encode(&criteria)).q, "nádraží");
    }

    #[test]
    fn malformed_escapes_pass_through_literally() {
        assert_eq!(decode("q=100%").q, "100%");
        assert_eq!(decode("q=%zz").q, "%zz");
    }

    #[test]
    fn empty_criteria_encode_to_empty_parameters() {
        let encoded = encode(&FilterCriteria::default());
        assert_eq!(encoded, "types=&districts=&q=");
        let params = decode(&encoded);
        assert_eq!(params, QueryParams::default());
    }
}
