use std::cell::RefCell;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use transplant_logger::MessageSink;

#[derive(Default)]
pub struct RecordingSink {
    debug: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
}

impl RecordingSink {
    pub fn debug_messages(&self) -> Vec<String> {
        self.debug.borrow().clone()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl MessageSink for RecordingSink {
    fn debug(&self, message: &str) {
        self.debug.borrow_mut().push(message.to_string());
    }

    fn alert_error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

pub fn sha256(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fs::read(path).unwrap());
    format!("{:x}", hasher.finalize())
}
