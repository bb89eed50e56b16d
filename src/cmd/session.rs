//! Sign-in commands: `studio login|logout|whoami|passwd`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password};
use studio_common::capabilities;

use super::App;

pub async fn cmd_login(app: &App, username: Option<String>, password: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let user = app
        .api()
        .auth()
        .login(&username, &password)
        .await
        .context("Login failed")?;

    println!(
        "{} Logged in as {} ({})",
        style("✓").green(),
        style(user.display_name()).bold(),
        user.role
    );
    Ok(())
}

pub fn cmd_logout(app: &App) -> Result<()> {
    app.api().auth().logout()?;
    println!("Logged out.");
    Ok(())
}

pub async fn cmd_whoami(app: &App) -> Result<()> {
    let user = app.user().await?;
    let caps = capabilities(user.role);

    println!();
    println!("{}", style(user.display_name()).bold());
    println!("  username: {}", user.username);
    if !user.email.is_empty() {
        println!("  email:    {}", user.email);
    }
    println!("  role:     {}", user.role);
    println!(
        "  sections: {}",
        caps.sections
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  server:   {}", app.config.api_url);
    println!();
    Ok(())
}

pub async fn cmd_passwd(app: &App) -> Result<()> {
    app.user().await?;
    let old = Password::new()
        .with_prompt("Current password")
        .interact()
        .context("Failed to read password")?;
    let new = Password::new()
        .with_prompt("New password")
        .with_confirmation("Repeat new password", "Passwords do not match")
        .interact()
        .context("Failed to read password")?;

    app.api()
        .auth()
        .change_password(&old, &new)
        .await
        .context("Password change failed")?;
    println!("{} Password changed.", style("✓").green());
    Ok(())
}
