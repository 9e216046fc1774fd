use pinocchio::{account_info::AccountInfo, program_error::ProgramError, ProgramResult};
use pinocchio_log::log;

/// Scaffold entry point: takes no accounts and no arguments.
pub struct Initialize;

impl TryFrom<(&[u8], &[AccountInfo])> for Initialize {
    type Error = ProgramError;

    fn try_from((data, _accounts): (&[u8], &[AccountInfo])) -> Result<Self, Self::Error> {
        if !data.is_empty() {
            return Err(ProgramError::InvalidInstructionData);
        }

        Ok(Self)
    }
}

impl Initialize {
    pub const DISCRIMINATOR: &'static u8 = &0;

    pub fn process(&self) -> ProgramResult {
        log!("Greetings from the SRL program");
        Ok(())
    }
}
