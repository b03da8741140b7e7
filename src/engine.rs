use uuid::Uuid;

use crate::admin::AdminSession;
use crate::domain::{
    AccountReport, Clock, Command, CommandKind, DeadLetterQueue, DeviceResolver, Error,
    KeyValueStore, Resolution,
    traits::CommandStream,
};
use crate::identity::Registration;
use crate::platform::Platform;
use crate::quiz::StaticQuizBank;

use futures::StreamExt;

/// Replays a command stream against a [`Platform`], sending every rejected
/// command to the dead-letter queue.
#[derive(Debug)]
pub struct Engine<I, S, D, R, C>
where
    I: CommandStream,
    S: KeyValueStore,
    D: DeadLetterQueue,
    R: DeviceResolver,
    C: Clock,
{
    ingestion: I,
    platform: Platform<S, C>,
    dlq: D,
    resolver: R,
    quiz: StaticQuizBank,
    admin: Option<AdminSession>,
}

impl<I, S, D, R, C> Engine<I, S, D, R, C>
where
    I: CommandStream,
    S: KeyValueStore,
    D: DeadLetterQueue,
    R: DeviceResolver,
    C: Clock,
{
    pub fn new(ingestion: I, platform: Platform<S, C>, dlq: D, resolver: R) -> Self {
        Self {
            ingestion,
            platform,
            dlq,
            resolver,
            quiz: StaticQuizBank::builtin(),
            admin: None,
        }
    }

    pub fn platform(&self) -> &Platform<S, C> {
        &self.platform
    }

    pub fn dlq(&self) -> &D {
        &self.dlq
    }

    pub async fn process(&mut self) -> Result<(), Error> {
        let mut res = self.ingestion.stream();

        while let Some(cmd) = res.next().await {
            match cmd {
                Ok(cmd) => {
                    let label = cmd.to_string();
                    match self.apply_command(cmd).await {
                        Ok(()) => tracing::debug!("{} applied", label),
                        Err(e) => {
                            tracing::debug!("{} rejected", label);
                            self.dlq.report(&e)
                        }
                    }
                }
                Err(e) => self.dlq.report(&e),
            }
        }

        Ok(())
    }

    async fn apply_command(&mut self, cmd: Command) -> Result<(), Error> {
        match cmd.kind {
            CommandKind::Register {
                display_name,
                referral_code,
            } => {
                let device = self.device(cmd.device).await;
                let number = cmd.payment_number.unwrap_or_default();
                self.platform.register(Registration::new(
                    number,
                    display_name,
                    device,
                    referral_code.as_deref(),
                ))?;
                Ok(())
            }
            CommandKind::Login => {
                let device = self.device(cmd.device).await;
                let number = cmd.payment_number.unwrap_or_default();
                self.platform.login(&number, &device)?;
                Ok(())
            }
            CommandKind::Logout => self.platform.logout(),
            CommandKind::AnswerQuiz { quiz_id, answer } => {
                self.platform.answer_quiz(&self.quiz, quiz_id, &answer)
            }
            CommandKind::WatchAd { amount } => {
                let amount = amount.unwrap_or_else(|| self.platform.sample_ad_reward());
                self.platform.complete_ad_view(amount)?;
                Ok(())
            }
            CommandKind::Withdraw { amount } => {
                self.platform.request_withdrawal(amount)?;
                Ok(())
            }
            CommandKind::AdminLogin { password } => {
                self.admin = Some(self.platform.authenticate_admin(&password)?);
                Ok(())
            }
            CommandKind::MarkProcessing => {
                let admin = self.admin.clone().ok_or(Error::Unauthorized)?;
                let request_id = self.open_request_of(cmd.payment_number.as_deref())?;
                self.platform.admin_mark_processing(&admin, request_id)?;
                Ok(())
            }
            CommandKind::Complete => {
                self.resolve_open_request(cmd.payment_number.as_deref(), Resolution::Completed)
            }
            CommandKind::Reject => {
                self.resolve_open_request(cmd.payment_number.as_deref(), Resolution::Rejected)
            }
            CommandKind::Block => {
                let admin = self.admin.clone().ok_or(Error::Unauthorized)?;
                let account = self.account_by_number(cmd.payment_number.as_deref())?;
                self.platform.block_account_device(&admin, account)?;
                Ok(())
            }
        }
    }

    fn resolve_open_request(&mut self, number: Option<&str>, resolution: Resolution) -> Result<(), Error> {
        let admin = self.admin.clone().ok_or(Error::Unauthorized)?;
        let request_id = self.open_request_of(number)?;
        self.platform.admin_resolve(&admin, request_id, resolution)?;
        Ok(())
    }

    async fn device(&self, supplied: Option<String>) -> String {
        match supplied {
            Some(device) => device,
            None => self.resolver.device_id().await,
        }
    }

    fn account_by_number(&self, number: Option<&str>) -> Result<Uuid, Error> {
        let number = number.unwrap_or_default();
        self.platform
            .find_by_payment_number(number)?
            .map(|a| a.id)
            .ok_or_else(|| Error::NotFound(format!("account {number}")))
    }

    fn open_request_of(&self, number: Option<&str>) -> Result<Uuid, Error> {
        let account_id = self.account_by_number(number)?;
        self.platform
            .withdrawals_of(account_id)?
            .into_iter()
            .find(|w| w.status.is_open())
            .map(|w| w.id)
            .ok_or_else(|| Error::NotFound(format!("open withdrawal for account {account_id}")))
    }

    pub fn flush<O: AccountReport>(&mut self, output: &mut O) -> Result<(), Error> {
        let accounts = self.platform.repository().accounts()?;
        output.write_accounts(&accounts)
    }
}
