//! Confirmation gate for destructive batches.

use std::io;

/// Whether destructive batches ask the operator first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmMode {
    #[default]
    Confirm,
    NoConfirm,
}

impl ConfirmMode {
    pub fn from_no_confirm_flag(no_confirm: bool) -> Self {
        if no_confirm {
            Self::NoConfirm
        } else {
            Self::Confirm
        }
    }
}

/// Result of passing a batch through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Proceed,
    Declined,
}

/// Asks the operator to approve a batch.
///
/// Implementations show `description` and return `Ok(true)` only for an
/// explicit yes. Failing to show the prompt is an error, never an implicit yes.
pub trait ConfirmPrompt {
    fn confirm(&self, description: &str) -> io::Result<bool>;
}

/// Pass a batch description through the gate.
pub fn confirm_batch(
    mode: ConfirmMode,
    prompt: &dyn ConfirmPrompt,
    description: &str,
) -> io::Result<Confirmation> {
    if mode == ConfirmMode::NoConfirm {
        return Ok(Confirmation::Proceed);
    }

    if prompt.confirm(description)? {
        Ok(Confirmation::Proceed)
    } else {
        tracing::debug!("Batch declined at confirmation prompt");
        Ok(Confirmation::Declined)
    }
}

/// Terminal prompt backed by `dialoguer`.
///
/// The description goes to stderr so stdout only ever carries listings.
#[cfg(feature = "cli")]
#[derive(Debug, Default)]
pub struct TerminalPrompt;

#[cfg(feature = "cli")]
impl ConfirmPrompt for TerminalPrompt {
    fn confirm(&self, description: &str) -> io::Result<bool> {
        use dialoguer::{Confirm, theme::ColorfulTheme};

        eprintln!("{description}");
        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Continue?")
            .default(false)
            .interact_opt()
            .map_err(io::Error::other)?;

        // Esc/q dismisses the prompt, which counts as "no".
        Ok(answer == Some(true))
    }
}
