pub mod contract;
pub mod present;

pub use contract::{
    Contract, ContractStatus, ErrorBody, ExtractedData, GapAnalysis, StatusResponse,
    UploadReceipt,
};
pub use present::{
    CategorySection, CompletedView, DetailView, FieldLine, GapSection, NO_MISSING_FIELDS_MESSAGE,
    NOT_READY_MESSAGE, present, render_value,
};
