/// How per-asset EUR amounts are chosen.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AmountPolicy {
    /// Ask for each amount, offering the configured default.
    #[default]
    Prompt,
    /// Use the configured defaults without asking.
    Defaults,
}

/// Whether orders wait for a `y`/`yes` answer.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmPolicy {
    #[default]
    Prompt,
    /// Treat the confirmation as given. Funds and volume checks still apply.
    AssumeYes,
}

/// Knobs for one DCA run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DcaPolicies {
    pub amounts: AmountPolicy,
    pub confirm: ConfirmPolicy,
    /// Send orders with `validate=true` so the exchange checks but does not execute them.
    pub validate_only: bool,
}

impl DcaPolicies {
    /// Interactive run: prompt for amounts and confirmation.
    #[must_use]
    pub fn interactive() -> Self {
        Self::default()
    }

    /// Unattended run, e.g. from cron: configured amounts, no confirmation prompt.
    #[must_use]
    pub fn unattended() -> Self {
        Self {
            amounts: AmountPolicy::Defaults,
            confirm: ConfirmPolicy::AssumeYes,
            validate_only: false,
        }
    }

    #[must_use]
    pub const fn with_validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }
}
