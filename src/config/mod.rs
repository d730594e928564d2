mod settings;

pub use settings::{
    ColdStartMode, DomainKind, ExtractionPolicy, HistoryConfig, LLMConfig, LoggingConfig,
    OutputMode, RoutingConfig, Settings,
};
