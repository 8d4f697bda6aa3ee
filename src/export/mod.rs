mod exporter;

pub use exporter::ExportReport;
pub use exporter::Exporter;
pub use exporter::ItemOutcome;
