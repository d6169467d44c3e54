use inquire::error::InquireResult;

/// The questions the wizard can ask.
///
/// Every call blocks until the user answers. Cancelling (Esc / Ctrl+C)
/// surfaces as `InquireError::OperationCanceled`.
pub trait Prompter {
    fn confirm(&mut self, message: &str, help: Option<&str>) -> InquireResult<bool>;

    fn text(&mut self, message: &str, help: Option<&str>) -> InquireResult<String>;

    /// Like [`Prompter::text`] but the input is masked.
    fn secret(&mut self, message: &str) -> InquireResult<String>;

    /// Returns the index of the chosen option.
    fn select(&mut self, message: &str, options: &[&str]) -> InquireResult<usize>;
}

/// Terminal prompts through `inquire`.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn confirm(&mut self, message: &str, help: Option<&str>) -> InquireResult<bool> {
        let mut prompt = inquire::Confirm::new(message).with_default(false);
        if let Some(help) = help {
            prompt = prompt.with_help_message(help);
        }
        prompt.prompt()
    }

    fn text(&mut self, message: &str, help: Option<&str>) -> InquireResult<String> {
        let mut prompt = inquire::Text::new(message);
        if let Some(help) = help {
            prompt = prompt.with_help_message(help);
        }
        prompt.prompt().map(|s| s.trim().to_string())
    }

    fn secret(&mut self, message: &str) -> InquireResult<String> {
        inquire::Password::new(message)
            .without_confirmation()
            .with_display_toggle_enabled()
            .prompt()
            .map(|s| s.trim().to_string())
    }

    fn select(&mut self, message: &str, options: &[&str]) -> InquireResult<usize> {
        inquire::Select::new(message, options.to_vec())
            .with_help_message("Use arrow keys to navigate, Enter to select")
            .raw_prompt()
            .map(|choice| choice.index)
    }
}
