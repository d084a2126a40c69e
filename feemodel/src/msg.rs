//! Transactions accepted by the fee model.

use crate::{
    error::{Error, Result},
    keeper::Keeper,
    params::Params,
    store::KvStore,
};
use serde::{Deserialize, Serialize};

/// Replace all module parameters. Must be signed by the governance
/// authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub authority: String,
    pub params: Params,
}

impl MsgUpdateParams {
    pub fn validate_basic(&self) -> Result<()> {
        if self.authority.trim().is_empty() {
            return Err(Error::InvalidRequest("authority must not be empty".to_string()));
        }
        self.params.validate_basic()?;
        Ok(())
    }

    pub fn signers(&self) -> Vec<&str> {
        vec![self.authority.as_str()]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParamsResponse {}

pub struct MsgServer<'a, S> {
    keeper: &'a mut Keeper<S>,
}

impl<'a, S: KvStore> MsgServer<'a, S> {
    pub fn new(keeper: &'a mut Keeper<S>) -> Self {
        Self { keeper }
    }

    pub fn update_params(&mut self, msg: MsgUpdateParams) -> Result<MsgUpdateParamsResponse> {
        msg.validate_basic()?;
        self.keeper.update_params(&msg.authority, msg.params)?;
        Ok(MsgUpdateParamsResponse {})
    }
}
