use crate::symbols::DEFAULT_ENTRY_POINT;

/// Knobs for one translation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Emit the SP initialisation and entry-point call before the first unit.
    pub bootstrap: bool,
    pub entry_point: String,
    /// Echo each VM command as an assembly comment above its block.
    pub annotate: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            bootstrap: true,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            annotate: true,
        }
    }
}

impl TranslatorConfig {
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    pub fn annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }
}

#[test]
fn test_builder() {
    let config = TranslatorConfig::default()
        .bootstrap(false)
        .entry_point("Main.main")
        .annotate(false);
    assert!(!config.bootstrap);
    assert!(!config.annotate);
    assert_eq!(config.entry_point, "Main.main");
    assert_eq!(TranslatorConfig::default().entry_point, "Sys.init");
}
