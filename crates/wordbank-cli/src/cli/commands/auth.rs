//! Session command handlers.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use wordbank_core::{AppContext, Route};

use super::print_json;

pub async fn login(
    ctx: &AppContext,
    email: &str,
    password: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    ctx.login(email, password, cancel)
        .await
        .context("sign in")?;
    print_signed_in(ctx);
    Ok(())
}

pub async fn register(
    ctx: &AppContext,
    email: &str,
    username: &str,
    password: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    ctx.register(email, username, password, cancel)
        .await
        .context("register")?;
    print_signed_in(ctx);
    Ok(())
}

fn print_signed_in(ctx: &AppContext) {
    if let Some(username) = ctx
        .store()
        .select(|s| s.auth.user().map(|user| user.username.clone()))
    {
        println!("Signed in as {username}");
    }
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.logout().await.context("clear stored tokens")?;
    println!("Signed out");
    Ok(())
}

pub async fn me(ctx: &AppContext, cancel: &CancellationToken) -> Result<()> {
    ctx.get_me(cancel).await.context("load current user")?;
    let user = ctx.store().select(|s| s.auth.user().cloned());
    print_json(&user)
}

pub async fn bootstrap(
    ctx: &AppContext,
    provider_signed_in: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let route = ctx
        .bootstrap(provider_signed_in, cancel)
        .await
        .context("restore session")?;

    let name = match route {
        Route::Onboarding => "onboarding",
        Route::SignIn => "sign-in",
        Route::Home => "home",
    };
    println!("{name}");
    if let Some(message) = ctx.store().select(|s| s.auth.auth_error.clone()) {
        eprintln!("{message}");
    }
    Ok(())
}

pub async fn onboarded(ctx: &AppContext, value: bool) -> Result<()> {
    ctx.set_has_onboarded(value)
        .await
        .context("save onboarding flag")?;
    println!("has_onboarded = {value}");
    Ok(())
}
