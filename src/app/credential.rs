use tokio::sync::watch;

/// Current text of the class-code input.
#[derive(Debug)]
pub struct CredentialHolder {
    code: watch::Sender<String>,
}

impl Default for CredentialHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHolder {
    pub fn new() -> Self {
        let (code, _) = watch::channel(String::new());
        Self { code }
    }

    /// Replace the code. No validation; the server decides what is a class.
    pub fn set_code(&self, value: impl Into<String>) {
        let value = value.into();
        self.code.send_if_modified(|code| {
            if *code == value {
                return false;
            }
            *code = value;
            true
        });
    }

    pub fn code(&self) -> String {
        self.code.borrow().clone()
    }

    pub fn clear(&self) {
        self.set_code(String::new());
    }

    /// Return the current code and leave the input empty, in one step.
    pub fn take_snapshot(&self) -> String {
        self.code.send_replace(String::new())
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.code.subscribe()
    }
}
