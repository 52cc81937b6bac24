//! Field projections for the BVL endpoints.
//!
//! Output names are the lower-case form of the upstream column names.
//! Identifier fields such as `kennr`, `wirknr` and `awg_id` reference
//! other endpoints; clients join on them.

use serde_json::json;

use super::FieldProjection;

/// Project each `(output, SOURCE)` pair in order.
fn projection(endpoint: &str, fields: &[(&str, &str)]) -> FieldProjection {
    fields
        .iter()
        .fold(FieldProjection::new(endpoint), |rule, (output, source)| {
            rule.field(*output, *source)
        })
}

pub(super) fn rules() -> Vec<FieldProjection> {
    vec![
        projection(
            "mittel",
            &[
                ("kennr", "KENNR"),
                ("mittelname", "MITTELNAME"),
                ("formulierung_art", "FORMULIERUNG_ART"),
                ("zul_erstmalig_am", "ZUL_ERSTMALIG_AM"),
                ("zul_ende", "ZUL_ENDE"),
                ("wirkungsbereich", "WIRKUNGSBEREICH"),
                ("kennr_zul", "KENNR_ZUL"),
            ],
        )
        .constant("is_active", json!(true)),
        projection(
            "mittel_abgelaufen",
            &[
                ("kennr", "KENNR"),
                ("mittelname", "MITTELNAME"),
                ("formulierung_art", "FORMULIERUNG_ART"),
                ("zul_erstmalig_am", "ZUL_ERSTMALIG_AM"),
                ("zul_ende", "ZUL_ENDE"),
                ("aufbrauchfrist", "AUFBRAUCHFRIST"),
                ("status", "STATUS"),
            ],
        )
        .constant("is_active", json!(false)),
        projection(
            "wirkstoff",
            &[
                ("wirknr", "WIRKNR"),
                ("wirkstoffname", "WIRKSTOFFNAME"),
                ("wirkstoffname_en", "WIRKSTOFFNAME_EN"),
                ("cas_nr", "CAS_NR"),
                ("kategorie", "KATEGORIE"),
            ],
        ),
        projection(
            "wirkstoff_gehalt",
            &[
                ("kennr", "KENNR"),
                ("wirknr", "WIRKNR"),
                ("gehalt", "GEHALT"),
                ("gehalt_einheit", "GEHALT_EINHEIT"),
                ("gehalt_art", "GEHALT_ART"),
            ],
        ),
        projection(
            "awg",
            &[
                ("awg_id", "AWG_ID"),
                ("kennr", "KENNR"),
                ("awg_auflagen", "AWG_AUFLAGEN"),
                ("awg_anwendungsbereich", "AWG_ANWENDUNGSBEREICH"),
                ("awg_bis", "AWG_BIS"),
                ("awg_von", "AWG_VON"),
                ("antragsteller", "ANTRAGSTELLER"),
                ("datum", "DATUM"),
            ],
        ),
        projection(
            "awg_kultur",
            &[
                ("awg_id", "AWG_ID"),
                ("kultur", "KULTUR"),
                ("kultur_gruppe", "KULTUR_GRUPPE"),
                ("schadorg", "SCHADORG"),
            ],
        ),
        projection(
            "awg_schadorg",
            &[
                ("awg_id", "AWG_ID"),
                ("schadorg", "SCHADORG"),
                ("schadorg_gruppe", "SCHADORG_GRUPPE"),
            ],
        ),
        projection(
            "awg_aufwand",
            &[
                ("awg_id", "AWG_ID"),
                ("aufwand", "AUFWAND"),
                ("aufwand_einheit", "AUFWAND_EINHEIT"),
                ("aufwand_text", "AUFWAND_TEXT"),
                ("stadium_von", "STADIUM_VON"),
                ("stadium_bis", "STADIUM_BIS"),
            ],
        ),
        projection(
            "awg_wartezeit",
            &[
                ("awg_id", "AWG_ID"),
                ("wartezeit_tage", "WARTEZEIT_TAGE"),
                ("wartezeit_text", "WARTEZEIT_TEXT"),
                ("kultur", "KULTUR"),
                ("ernte_nutzung", "ERNTE_NUTZUNG"),
            ],
        ),
        projection(
            "awg_zulassung",
            &[
                ("awg_id", "AWG_ID"),
                ("zulassungsnr", "ZULASSUNGSNR"),
                ("zul_von", "ZUL_VON"),
                ("zul_bis", "ZUL_BIS"),
                ("status", "STATUS"),
            ],
        ),
        projection(
            "auflagen",
            &[
                ("auession", "AUESSION"),
                ("auession_gruppe", "AUESSION_GRUPPE"),
                ("auflage", "AUFLAGE"),
                ("auflage_gruppe", "AUFLAGE_GRUPPE"),
            ],
        ),
        projection(
            "kode",
            &[
                ("koession", "KOESSION"),
                ("koession_art", "KOESSION_ART"),
                ("kode_text", "KODE_TEXT"),
                ("kode_zusatz", "KODE_ZUSATZ"),
            ],
        ),
        projection(
            "kodeliste",
            &[("koession_art", "KOESSION_ART"), ("beschreibung", "BESCHREIBUNG")],
        ),
        projection(
            "kultur_gruppe",
            &[
                ("kultur", "KULTUR"),
                ("kultur_name", "KULTUR_NAME"),
                ("eppo_code", "EPPO_CODE"),
                ("kultur_gruppe", "KULTUR_GRUPPE"),
            ],
        ),
        projection(
            "schadorg_gruppe",
            &[
                ("schadorg", "SCHADORG"),
                ("schadorg_name", "SCHADORG_NAME"),
                ("eppo_code", "EPPO_CODE"),
                ("schadorg_gruppe", "SCHADORG_GRUPPE"),
            ],
        ),
        projection(
            "adresse",
            &[
                ("aession", "AESSION"),
                ("firma", "FIRMA"),
                ("strasse", "STRASSE"),
                ("plz", "PLZ"),
                ("ort", "ORT"),
                ("land", "LAND"),
                ("telefon", "TELEFON"),
                ("email", "EMAIL"),
                ("url", "URL"),
            ],
        ),
        projection(
            "mittel_vertrieb",
            &[
                ("kennr", "KENNR"),
                ("aession", "AESSION"),
                ("vertrieb_art", "VERTRIEB_ART"),
            ],
        ),
        projection(
            "ghs_gefahrenhinweise",
            &[("h_nr", "H_NR"), ("h_text", "H_TEXT"), ("signalwort", "SIGNALWORT")],
        ),
        projection(
            "ghs_sicherheitshinweise",
            &[("p_nr", "P_NR"), ("p_text", "P_TEXT")],
        ),
        projection(
            "ghs_gefahrensymbole",
            &[
                ("symbol", "SYMBOL"),
                ("symbol_text", "SYMBOL_TEXT"),
                ("bild_url", "BILD_URL"),
            ],
        ),
        projection(
            "mittel_gefahren_symbol",
            &[
                ("kennr", "KENNR"),
                ("symbol", "SYMBOL"),
                ("h_nr", "H_NR"),
                ("p_nr", "P_NR"),
            ],
        ),
        projection(
            "hinweis",
            &[
                ("kennr", "KENNR"),
                ("hinweis_art", "HINWEIS_ART"),
                ("hinweis_text", "HINWEIS_TEXT"),
            ],
        ),
        projection(
            "staerkung",
            &[
                ("kennr", "KENNR"),
                ("mittelname", "MITTELNAME"),
                ("formulierung_art", "FORMULIERUNG_ART"),
                ("antragsteller", "ANTRAGSTELLER"),
                ("listung_von", "LISTUNG_VON"),
                ("listung_bis", "LISTUNG_BIS"),
            ],
        ),
        projection(
            "zusatzstoff",
            &[
                ("kennr", "KENNR"),
                ("mittelname", "MITTELNAME"),
                ("formulierung_art", "FORMULIERUNG_ART"),
                ("antragsteller", "ANTRAGSTELLER"),
                ("listung_von", "LISTUNG_VON"),
                ("listung_bis", "LISTUNG_BIS"),
            ],
        ),
        projection(
            "stand",
            &[
                ("stand_datum", "STAND_DATUM"),
                ("stand_text", "STAND_TEXT"),
                ("version", "VERSION"),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{FieldSource, TransformRule};

    #[test]
    fn one_rule_per_endpoint() {
        let rules = rules();
        let mut names: Vec<_> = rules.iter().map(|r| r.endpoint()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn active_flag_distinguishes_current_and_expired_products() {
        let rules = rules();
        let find = |name: &str| rules.iter().find(|r| r.endpoint() == name).unwrap();
        assert_eq!(
            find("mittel").source_of("is_active"),
            Some(&FieldSource::Constant(json!(true)))
        );
        assert_eq!(
            find("mittel_abgelaufen").source_of("is_active"),
            Some(&FieldSource::Constant(json!(false)))
        );
    }

    #[test]
    fn outputs_are_lower_case() {
        for rule in rules() {
            for field in rule.declared_fields() {
                assert_eq!(field, field.to_lowercase(), "{}: {}", rule.endpoint(), field);
            }
        }
    }
}
