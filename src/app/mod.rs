pub mod enrich_use_case;
pub mod ports;
pub mod quality_use_case;
