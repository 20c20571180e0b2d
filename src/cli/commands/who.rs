//! cli::commands::who
//!
//! Print the login of the token owner.

use std::sync::Arc;

use anyhow::Result;

use super::runtime;
use crate::cli::Context;
use crate::forge::create_forge;

/// Run the who command.
pub fn who(ctx: &Context) -> Result<()> {
    let provider = ctx.token_provider()?;
    // The user endpoint is not repository scoped
    let forge = create_forge(Arc::clone(&provider), ctx.config.api_base(), "", "");
    let login = runtime()?.block_on(forge.current_user())?;
    println!("{}", login);
    Ok(())
}
