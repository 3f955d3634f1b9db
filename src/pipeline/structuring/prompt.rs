//! Prompt builders for the structuring and vision calls.
//!
//! The response shape is a contract with the table parser: an HTML `<table>`
//! with exactly the columns [Parametr, Wartość, Komentarz, Data badania
//! (YYYY-MM-DD)], missing dates defaulted to today, missing reference ranges
//! defaulted to standard ones, out-of-range values flagged in the comment.

use crate::models::{Parameter, PatientContext};

/// How many of the user's most recent measurements are fed back into the
/// structuring prompt as longitudinal context.
pub const RECENT_HISTORY_WINDOW: usize = 10;

pub const ANALYST_SYSTEM_PROMPT: &str = "\
Jesteś doświadczonym lekarzem, który analizuje wyniki badań laboratoryjnych. \
Przeprowadzasz dokładną analizę tych badań biorąc pod uwagę choroby, leki i objawy pacjenta. \
Zwracasz szczególną uwagę na nieprawidłowe wyniki. Zachowujesz profesjonalny i empatyczny ton. \
Potrafisz odczytać i zinterpretować nawet niewyraźne lub częściowo uszkodzone wyniki badań. \
Jeśli dane są niekompletne lub nieczytelne, zaznaczasz to w komentarzu.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "\
Jesteś doświadczonym lekarzem, który analizuje wyniki badań i udziela zrozumiałych porad zdrowotnych.";

/// Build the structuring prompt for raw extracted text.
pub fn build_analysis_prompt(
    raw_text: &str,
    patient: &PatientContext,
    history: &[Parameter],
) -> String {
    let mut prompt = format!(
        "Biorąc pod uwagę moje symptomy: {}, oraz choroby przewlekłe: {}, \
         oraz leki jakie biorę: {}, przeanalizuj poniższe wyniki badań laboratoryjnych.\n\n\
         Podaj wyniki badań w tabeli HTML (<table>) z następującymi kolumnami: \
         Parametr, Wartość, Komentarz, Data badania (YYYY-MM-DD).\n",
        patient.symptoms_or_none(),
        patient.chronic_diseases_or_none(),
        patient.medications_or_none(),
    );

    if !history.is_empty() {
        prompt.push_str("\nMoje ostatnie wcześniejsze wyniki (do porównania trendów):\n");
        for param in history.iter().take(RECENT_HISTORY_WINDOW) {
            prompt.push_str(&param.as_history_line());
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!(
        "\nOto tekst z badania (wyniki laboratoryjne):\n{raw_text}\n\n\
         Jeśli w tekście nie ma wyraźnych dat badań, użyj dzisiejszej daty.\n\
         Jeśli w tekście nie ma wyraźnych wartości referencyjnych, dodaj standardowe \
         zakresy referencyjne w komentarzu.\n\
         Jeśli jakieś wartości są poza zakresem referencyjnym, wyraźnie to zaznacz w komentarzu."
    ));

    prompt
}

/// Build the instruction prompt for the vision backend. The model's answer
/// is a direct analysis — it must come back in the same table shape the
/// parser expects, with the patient context already taken into account.
pub fn build_vision_prompt(patient: &PatientContext) -> String {
    format!(
        "Jestem lekarzem analizującym wyniki badań medycznych.\n\n\
         KONTEKST PACJENTA:\n\
         - Symptomy: {}\n\
         - Choroby przewlekłe: {}\n\
         - Leki: {}\n\n\
         ZADANIE: Przeanalizuj dokument medyczny na obrazach i wyciągnij WSZYSTKIE \
         parametry laboratoryjne/badań w formacie strukturyzowanym.\n\n\
         WYMAGANY FORMAT ODPOWIEDZI:\n\
         Podaj wyniki w tabeli HTML <table> z kolumnami:\n\
         - Parametr\n\
         - Wartość\n\
         - Komentarz (uwagi, zakres referencyjny)\n\
         - Data badania (YYYY-MM-DD)\n\n\
         Jeśli nie ma wyraźnej daty, użyj dzisiejszej. Jeśli nie ma zakresów \
         referencyjnych, dodaj standardowe.\n\
         Zaznacz wartości poza normą.",
        patient.symptoms_or_none(),
        patient.chronic_diseases_or_none(),
        patient.medications_or_none(),
    )
}

/// Build the health-summary prompt from accumulated measurements.
pub fn build_summary_prompt(params: &[Parameter]) -> String {
    let lines = params
        .iter()
        .map(|p| p.as_history_line())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Na podstawie tych parametrów zdrowotnych, przygotuj krótkie podsumowanie \
         stanu zdrowia pacjenta, wskazując na potencjalne problemy i zalecenia. \
         Użyj formatowania HTML dla lepszej czytelności.\n\n{lines}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn patient() -> PatientContext {
        PatientContext {
            symptoms: "zmęczenie".into(),
            chronic_diseases: String::new(),
            medications: "metformina".into(),
        }
    }

    fn param(name: &str, date: &str) -> Parameter {
        Parameter {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            name: name.into(),
            value: "95 mg/dl".into(),
            comment: "Norma 70-99".into(),
            measurement_date: date.parse::<NaiveDate>().unwrap(),
        }
    }

    #[test]
    fn analysis_prompt_embeds_patient_context() {
        let prompt = build_analysis_prompt("Glukoza 95", &patient(), &[]);
        assert!(prompt.contains("symptomy: zmęczenie"));
        assert!(prompt.contains("choroby przewlekłe: brak"));
        assert!(prompt.contains("leki jakie biorę: metformina"));
        assert!(prompt.contains("Glukoza 95"));
    }

    #[test]
    fn analysis_prompt_mandates_table_shape() {
        let prompt = build_analysis_prompt("tekst", &PatientContext::default(), &[]);
        assert!(prompt.contains("tabeli HTML (<table>)"));
        assert!(prompt.contains("Parametr, Wartość, Komentarz, Data badania (YYYY-MM-DD)"));
        assert!(prompt.contains("użyj dzisiejszej daty"));
        assert!(prompt.contains("standardowe"));
        assert!(prompt.contains("poza zakresem referencyjnym"));
    }

    #[test]
    fn analysis_prompt_without_history_has_no_history_section() {
        let prompt = build_analysis_prompt("tekst", &patient(), &[]);
        assert!(!prompt.contains("wcześniejsze wyniki"));
    }

    #[test]
    fn analysis_prompt_includes_bounded_history() {
        let history: Vec<Parameter> = (1..=15)
            .map(|d| param("Glukoza", &format!("2024-01-{d:02}")))
            .collect();
        let prompt = build_analysis_prompt("tekst", &patient(), &history);

        assert!(prompt.contains("wcześniejsze wyniki"));
        assert!(prompt.contains("Glukoza: 95 mg/dl (Norma 70-99) - data: 2024-01-01"));
        // Window bounded at 10 entries
        assert_eq!(prompt.matches("Glukoza: 95 mg/dl").count(), 10);
    }

    #[test]
    fn vision_prompt_embeds_context_and_format() {
        let prompt = build_vision_prompt(&patient());
        assert!(prompt.contains("Symptomy: zmęczenie"));
        assert!(prompt.contains("Choroby przewlekłe: brak"));
        assert!(prompt.contains("tabeli HTML <table>"));
        assert!(prompt.contains("Data badania (YYYY-MM-DD)"));
    }

    #[test]
    fn summary_prompt_lists_measurements() {
        let prompt = build_summary_prompt(&[param("TSH", "2024-02-01")]);
        assert!(prompt.contains("TSH: 95 mg/dl (Norma 70-99) - data: 2024-02-01"));
        assert!(prompt.contains("podsumowanie"));
    }
}
