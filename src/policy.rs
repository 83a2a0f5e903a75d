// Per-field binarization and OCR calibration

use std::fmt;

const DIGITS: &str = "0123456789";
const DIGITS_PERCENT: &str = "0123456789%";
const DIGITS_DECIMAL: &str = "0123456789,.";

/// Team 1 cells read with a lower cutoff so a lone zero survives binarization.
const ZERO_SENSITIVE_TEAM1: [&str; 5] = [
    "tabela_time1_faltas_cometidas",
    "tabela_time1_impedimentos",
    "tabela_time1_faltas",
    "tabela_time1_penaltis",
    "tabela_time1_cartoes_amarelos",
];

const OTHER_SINGLE_DIGIT: [&str; 17] = [
    "tabela_time1_recuperacao_bola",
    "tabela_time1_finalizacoes",
    "tabela_time1_divididas_ganhas",
    "tabela_time1_interceptacoes",
    "tabela_time1_defesas",
    "tabela_time1_escanteios",
    "tabela_time2_recuperacao_bola",
    "tabela_time2_finalizacoes",
    "tabela_time2_divididas_ganhas",
    "tabela_time2_interceptacoes",
    "tabela_time2_defesas",
    "tabela_time2_faltas_cometidas",
    "tabela_time2_impedimentos",
    "tabela_time2_escanteios",
    "tabela_time2_faltas",
    "tabela_time2_penaltis",
    "tabela_time2_cartoes_amarelos",
];

/// How a region is binarized and recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Circular percentage dial, light text on a dark ring.
    Dial,
    ZeroSensitiveDigit,
    SingleDigit,
    /// Multi-digit or decimal table cell.
    MultiDigit,
}

/// Direction of the threshold operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarization {
    /// Pixels above the cutoff become white (`THRESH_BINARY`).
    Normal,
    /// Pixels above the cutoff become black (`THRESH_BINARY_INV`).
    Inverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Default,
    LstmOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegmentation {
    SingleBlock,
    SingleLine,
    SingleChar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrConfig {
    pub engine_mode: EngineMode,
    pub page_segmentation: PageSegmentation,
    pub whitelist: &'static str,
}

impl Policy {
    /// Derive the policy from a region name.
    ///
    /// Precedence: `circulo_` prefix, then the zero-sensitive team 1 list,
    /// then the other single-digit cells, then multi-digit as the fallback.
    pub fn classify(name: &str) -> Self {
        if name.starts_with("circulo_") {
            Policy::Dial
        } else if ZERO_SENSITIVE_TEAM1.contains(&name) {
            Policy::ZeroSensitiveDigit
        } else if OTHER_SINGLE_DIGIT.contains(&name) {
            Policy::SingleDigit
        } else {
            Policy::MultiDigit
        }
    }

    pub fn threshold(self) -> f64 {
        match self {
            Policy::Dial => 170.0,
            Policy::ZeroSensitiveDigit => 140.0,
            Policy::SingleDigit => 160.0,
            Policy::MultiDigit => 170.0,
        }
    }

    pub fn binarization(self) -> Binarization {
        match self {
            Policy::Dial => Binarization::Normal,
            _ => Binarization::Inverted,
        }
    }

    pub fn ocr_config(self) -> OcrConfig {
        match self {
            Policy::Dial => OcrConfig {
                engine_mode: EngineMode::Default,
                page_segmentation: PageSegmentation::SingleLine,
                whitelist: DIGITS_PERCENT,
            },
            Policy::ZeroSensitiveDigit | Policy::SingleDigit => OcrConfig {
                engine_mode: EngineMode::Default,
                page_segmentation: PageSegmentation::SingleChar,
                whitelist: DIGITS,
            },
            Policy::MultiDigit => OcrConfig {
                engine_mode: EngineMode::LstmOnly,
                page_segmentation: PageSegmentation::SingleBlock,
                whitelist: DIGITS_DECIMAL,
            },
        }
    }
}

impl EngineMode {
    pub fn oem(self) -> u8 {
        match self {
            EngineMode::LstmOnly => 1,
            EngineMode::Default => 3,
        }
    }
}

impl PageSegmentation {
    pub fn psm(self) -> u8 {
        match self {
            PageSegmentation::SingleBlock => 6,
            PageSegmentation::SingleLine => 7,
            PageSegmentation::SingleChar => 10,
        }
    }
}

/// Renders the config the way it would be passed on the `tesseract` command line.
impl fmt::Display for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "--oem {} --psm {} -c tessedit_char_whitelist={}",
            self.engine_mode.oem(),
            self.page_segmentation.psm(),
            self.whitelist
        )
    }
}
