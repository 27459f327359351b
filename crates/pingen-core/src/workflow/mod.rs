//! Multi-step letter workflows

pub mod letters;

pub use letters::{
    load_meta_data, CreateLetterPlan, CreateLetterRequest, LetterOutcome, LetterWorkflow,
    SendLetterPlan, SendLetterRequest,
};
