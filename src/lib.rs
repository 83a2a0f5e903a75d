pub mod consts {
    use crate::policy::Policy;

    pub const REFERENCE_WIDTH: i32 = 1920;
    pub const REFERENCE_HEIGHT: i32 = 1080;

    /// A named statistic on the post-match summary screen, in 1920x1080 coordinates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatRegion {
        pub name: &'static str,
        pub x: i32,
        pub y: i32,
        pub width: i32,
        pub height: i32,
        pub policy: Policy,
    }

    impl StatRegion {
        pub fn rect(&self) -> opencv::core::Rect {
            opencv::core::Rect::new(self.x, self.y, self.width, self.height)
        }
    }

    #[rustfmt::skip]
    pub const MATCH_STATS_REGIONS: [StatRegion; 36] = [
        // Dials, left
        StatRegion { name: "circulo_time1_dribles", x: 300, y: 300, width: 100, height: 60, policy: Policy::Dial },
        StatRegion { name: "circulo_time1_precisao_fin", x: 300, y: 560, width: 100, height: 60, policy: Policy::Dial },
        StatRegion { name: "circulo_time1_precisao_pas", x: 300, y: 820, width: 100, height: 60, policy: Policy::Dial },

        // Dials, right
        StatRegion { name: "circulo_time2_dribles", x: 1520, y: 300, width: 100, height: 60, policy: Policy::Dial },
        StatRegion { name: "circulo_time2_precisao_fin", x: 1520, y: 560, width: 100, height: 60, policy: Policy::Dial },
        StatRegion { name: "circulo_time2_precisao_pas", x: 1520, y: 820, width: 100, height: 60, policy: Policy::Dial },

        // Table, team 1
        StatRegion { name: "tabela_time1_posse_bola", x: 660, y: 240, width: 47, height: 53, policy: Policy::MultiDigit },
        StatRegion { name: "tabela_time1_recuperacao_bola", x: 660, y: 300, width: 40, height: 40, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time1_finalizacoes", x: 660, y: 343, width: 40, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time1_gols_esperados", x: 660, y: 391, width: 60, height: 49, policy: Policy::MultiDigit },
        StatRegion { name: "tabela_time1_passes", x: 660, y: 441, width: 60, height: 47, policy: Policy::MultiDigit },
        StatRegion { name: "tabela_time1_divididas", x: 660, y: 490, width: 60, height: 48, policy: Policy::MultiDigit },
        StatRegion { name: "tabela_time1_divididas_ganhas", x: 660, y: 539, width: 60, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time1_interceptacoes", x: 660, y: 588, width: 60, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time1_defesas", x: 660, y: 636, width: 60, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time1_faltas_cometidas", x: 660, y: 686, width: 40, height: 48, policy: Policy::ZeroSensitiveDigit },
        StatRegion { name: "tabela_time1_impedimentos", x: 660, y: 735, width: 60, height: 48, policy: Policy::ZeroSensitiveDigit },
        StatRegion { name: "tabela_time1_escanteios", x: 660, y: 784, width: 40, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time1_faltas", x: 660, y: 833, width: 40, height: 48, policy: Policy::ZeroSensitiveDigit },
        StatRegion { name: "tabela_time1_penaltis", x: 660, y: 882, width: 40, height: 48, policy: Policy::ZeroSensitiveDigit },
        StatRegion { name: "tabela_time1_cartoes_amarelos", x: 648, y: 940, width: 52, height: 40, policy: Policy::ZeroSensitiveDigit },

        // Table, team 2
        StatRegion { name: "tabela_time2_posse_bola", x: 1220, y: 240, width: 49, height: 51, policy: Policy::MultiDigit },
        StatRegion { name: "tabela_time2_recuperacao_bola", x: 1220, y: 300, width: 40, height: 40, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_finalizacoes", x: 1220, y: 343, width: 40, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_gols_esperados", x: 1180, y: 392, width: 80, height: 48, policy: Policy::MultiDigit },
        StatRegion { name: "tabela_time2_passes", x: 1220, y: 441, width: 60, height: 47, policy: Policy::MultiDigit },
        StatRegion { name: "tabela_time2_divididas", x: 1220, y: 490, width: 60, height: 48, policy: Policy::MultiDigit },
        StatRegion { name: "tabela_time2_divididas_ganhas", x: 1200, y: 539, width: 60, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_interceptacoes", x: 1220, y: 588, width: 60, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_defesas", x: 1220, y: 636, width: 60, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_faltas_cometidas", x: 1220, y: 686, width: 40, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_impedimentos", x: 1200, y: 735, width: 72, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_escanteios", x: 1220, y: 784, width: 40, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_faltas", x: 1200, y: 833, width: 68, height: 47, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_penaltis", x: 1220, y: 882, width: 40, height: 48, policy: Policy::SingleDigit },
        StatRegion { name: "tabela_time2_cartoes_amarelos", x: 1211, y: 940, width: 58, height: 40, policy: Policy::SingleDigit },
    ];

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashSet;

        #[test]
        fn region_names_are_unique() {
            let names: HashSet<_> = MATCH_STATS_REGIONS.iter().map(|r| r.name).collect();
            assert_eq!(names.len(), MATCH_STATS_REGIONS.len());
        }

        #[test]
        fn table_policies_match_name_classification() {
            for region in &MATCH_STATS_REGIONS {
                assert_eq!(
                    region.policy,
                    Policy::classify(region.name),
                    "policy tag of {} disagrees with its name",
                    region.name
                );
            }
        }

        #[test]
        fn regions_fit_reference_canvas() {
            for region in &MATCH_STATS_REGIONS {
                assert!(region.width > 0 && region.height > 0, "{}", region.name);
                assert!(region.x + region.width <= REFERENCE_WIDTH, "{}", region.name);
                assert!(region.y + region.height <= REFERENCE_HEIGHT, "{}", region.name);
            }
        }
    }
}

pub mod error;
pub mod image_analyzer;
pub mod ocr;
pub mod policy;
pub mod server;
