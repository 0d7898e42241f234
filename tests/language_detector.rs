use vaani::application::services::language_detector::detect;
use vaani::domain::Language;

#[test]
fn given_marathi_text_when_detecting_then_classifies_as_marathi() {
    assert_eq!(detect("आहे मला जायचे"), Language::Marathi);
}

#[test]
fn given_devanagari_without_marathi_markers_when_detecting_then_classifies_as_hindi() {
    assert_eq!(detect("कल की मीटिंग में हम बजट पर चर्चा करेंगे"), Language::Hindi);
}

#[test]
fn given_english_sentence_when_detecting_then_classifies_as_english() {
    assert_eq!(detect("Hello, how are you today"), Language::English);
}

#[test]
fn given_empty_input_when_detecting_then_returns_default_hindi() {
    // The documented default for empty or undetectable input.
    assert_eq!(detect(""), Language::Hindi);
}

#[test]
fn given_whitespace_only_input_when_detecting_then_returns_default_hindi() {
    assert_eq!(detect("   \n\t  "), Language::Hindi);
}

#[test]
fn given_short_input_when_detecting_then_returns_default_hindi() {
    assert_eq!(detect("ok bye"), Language::Hindi);
}

#[test]
fn given_tamil_text_when_detecting_then_classifies_as_tamil() {
    assert_eq!(detect("இன்று கூட்டம் மிகவும் நன்றாக இருந்தது"), Language::Tamil);
}

#[test]
fn given_telugu_text_when_detecting_then_classifies_as_telugu() {
    assert_eq!(detect("ఈ రోజు సమావేశం చాలా బాగుంది"), Language::Telugu);
}

#[test]
fn given_bengali_text_when_detecting_then_classifies_as_bengali() {
    assert_eq!(detect("আজকের মিটিং খুব ভালো ছিল"), Language::Bengali);
}

#[test]
fn given_gujarati_text_when_detecting_then_classifies_as_gujarati() {
    assert_eq!(detect("આજની મીટિંગ ખૂબ સારી હતી"), Language::Gujarati);
}

#[test]
fn given_kannada_text_when_detecting_then_classifies_as_kannada() {
    assert_eq!(detect("ಇಂದಿನ ಸಭೆ ತುಂಬಾ ಚೆನ್ನಾಗಿತ್ತು"), Language::Kannada);
}

#[test]
fn given_punjabi_text_when_detecting_then_classifies_as_punjabi() {
    assert_eq!(detect("ਅੱਜ ਦੀ ਮੀਟਿੰਗ ਬਹੁਤ ਵਧੀਆ ਸੀ"), Language::Punjabi);
}

#[test]
fn given_latin_text_without_english_stop_words_when_detecting_then_returns_default_hindi() {
    // Romanized Hindi carries no English stop-word hits.
    assert_eq!(detect("kal meeting mein milte hain sab log"), Language::Hindi);
}

#[test]
fn given_same_input_when_detecting_repeatedly_then_result_is_identical() {
    let inputs = [
        "आहे मला जायचे",
        "Hello, how are you today",
        "",
        "ఈ రోజు సమావేశం చాలా బాగుంది",
    ];
    for input in inputs {
        let first = detect(input);
        for _ in 0..10 {
            assert_eq!(detect(input), first, "non-deterministic for {:?}", input);
        }
    }
}
