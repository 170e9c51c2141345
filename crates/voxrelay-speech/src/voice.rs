//! Voice listing and selection.

/// A voice offered by the speech engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// Language tag as reported by the engine (`en-gb`, `en_US`, ...).
    pub lang: String,
    /// Whether the engine marks this as its default voice.
    pub is_default: bool,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            is_default: false,
        }
    }

    fn is_english(&self) -> bool {
        self.lang.to_lowercase().starts_with("en")
    }
}

/// Pick a voice: the preferred name if present, else the first English
/// voice, else the engine default, else the first voice.
pub fn choose_voice<'a>(voices: &'a [Voice], preferred: Option<&str>) -> Option<&'a Voice> {
    preferred
        .and_then(|name| voices.iter().find(|v| v.name.eq_ignore_ascii_case(name)))
        .or_else(|| voices.iter().find(|v| v.is_english()))
        .or_else(|| voices.iter().find(|v| v.is_default))
        .or_else(|| voices.first())
}

/// Parse `espeak --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  5  en-gb           --/M      English_(Great_Britain) gmw/en
/// ```
pub fn parse_espeak_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            Some(Voice {
                name: cols[3].to_string(),
                lang: cols[1].to_string(),
                is_default: cols[3].eq_ignore_ascii_case("default")
                    || cols.get(4).is_some_and(|f| f.eq_ignore_ascii_case("default")),
            })
        })
        .collect()
}

/// Parse `say -v ?` output (macOS).
///
/// ```text
/// Alex                en_US    # Most people recognize me by my voice.
/// Bad News            en_US    # The light you see at the end of the tunnel...
/// ```
pub fn parse_say_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, lang) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || lang.is_empty() {
                return None;
            }
            Some(Voice::new(name, lang))
        })
        .collect()
}
