// src/common/serde_utils.rs
//
// Deserializadores usados nos payloads de criação / atualização parcial.
// Em PATCH precisamos distinguir "campo ausente" (None) de "campo = null"
// (Some(None)), por isso os campos anuláveis usam Option<Option<T>>.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date<E: de::Error>(raw: Option<String>) -> Result<Option<NaiveDate>, E> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|_| E::custom(format!("invalid date '{s}', expected YYYY-MM-DD"))),
    }
}

/// Data opcional: `null` e `""` viram `None`.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    parse_date(raw)
}

/// Texto opcional de formulário: `null`, `""` e só espaços viram `None`.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(non_blank(raw))
}

/// Campo anulável de PATCH. Só é chamado quando a chave existe no JSON.
pub fn patch_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Data anulável de PATCH (`""` equivale a `null`).
pub fn patch_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    parse_date(raw).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

/// Flags aceitam `true/false` e também `1/0` (formato dos clientes antigos).
pub fn patch_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(b) => Ok(Some(b)),
        FlagRepr::Int(0) => Ok(Some(false)),
        FlagRepr::Int(1) => Ok(Some(true)),
        FlagRepr::Int(other) => Err(de::Error::custom(format!("invalid flag value {other}"))),
    }
}

/// Texto vazio ou só com espaços conta como ausente.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| if v.trim().is_empty() { None } else { Some(v) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "patch_date")]
        when: Option<Option<NaiveDate>>,
        #[serde(default, deserialize_with = "patch_flag")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "optional_date")]
        plain: Option<NaiveDate>,
        #[serde(default, deserialize_with = "optional_text")]
        text: Option<String>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Fields = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.when, None);

        let null: Fields = serde_json::from_str(r#"{"when": null}"#).unwrap();
        assert_eq!(null.when, Some(None));

        let blank: Fields = serde_json::from_str(r#"{"when": ""}"#).unwrap();
        assert_eq!(blank.when, Some(None));

        let value: Fields = serde_json::from_str(r#"{"when": "2024-03-04"}"#).unwrap();
        assert_eq!(value.when, Some(NaiveDate::from_ymd_opt(2024, 3, 4)));
    }

    #[test]
    fn flags_accept_numeric_booleans() {
        let one: Fields = serde_json::from_str(r#"{"flag": 1}"#).unwrap();
        assert_eq!(one.flag, Some(true));
        let zero: Fields = serde_json::from_str(r#"{"flag": 0}"#).unwrap();
        assert_eq!(zero.flag, Some(false));
        assert!(serde_json::from_str::<Fields>(r#"{"flag": 7}"#).is_err());
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(serde_json::from_str::<Fields>(r#"{"plain": "04/03/2024"}"#).is_err());
        let empty: Fields = serde_json::from_str(r#"{"plain": ""}"#).unwrap();
        assert_eq!(empty.plain, None);
    }

    #[test]
    fn blank_form_text_is_absent() {
        let blank: Fields = serde_json::from_str(r#"{"text": "  "}"#).unwrap();
        assert_eq!(blank.text, None);
        let null: Fields = serde_json::from_str(r#"{"text": null}"#).unwrap();
        assert_eq!(null.text, None);
        let value: Fields = serde_json::from_str(r#"{"text": "Pat"}"#).unwrap();
        assert_eq!(value.text.as_deref(), Some("Pat"));
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some("12 Elm St".into())), Some("12 Elm St".into()));
    }
}
