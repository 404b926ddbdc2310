/*
[INPUT]:  Wallet subcommand arguments
[OUTPUT]: Wallet records created, listed, selected, extended or deleted
[POS]:    CLI layer - wallet lifecycle commands
[UPDATE]: When wallet lifecycle operations change
*/

use std::io::{BufRead, IsTerminal};

use anyhow::{Context, Result, anyhow};
use console::style;
use dialoguer::{Confirm, Password, theme::ColorfulTheme};
use uuid::Uuid;
use walletkit_core::{AssetSymbol, DerivationPath, MnemonicService, WalletRecord, WordCount};

use super::Session;

pub fn create(session: &Session, name: &str, words: usize) -> Result<()> {
    let count = match words {
        12 => WordCount::Twelve,
        24 => WordCount::TwentyFour,
        other => return Err(anyhow!("word count must be 12 or 24, got {other}")),
    };
    let phrase = MnemonicService::generate_with(count)?.phrase();
    let record = session.manager.create_or_recover(name, Some(phrase.as_str()))?;

    println!("{}", style("Wallet created").bold().green());
    print_summary(&record);
    println!(
        "\n{}",
        style("Write down this recovery phrase. It is the only way to restore the wallet.").yellow()
    );
    println!("{}", style(phrase.as_str()).bold());
    Ok(())
}

pub fn recover(session: &Session, name: &str, phrase: Option<String>) -> Result<()> {
    let phrase = match phrase {
        Some(phrase) => phrase,
        None => read_phrase()?,
    };
    let record = session.manager.create_or_recover(name, Some(phrase.trim()))?;

    println!("{}", style("Wallet recovered").bold().green());
    print_summary(&record);
    Ok(())
}

fn read_phrase() -> Result<String> {
    if std::io::stdin().is_terminal() {
        return Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Recovery phrase")
            .interact()
            .context("read recovery phrase");
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read recovery phrase from stdin")?;
    Ok(line)
}

pub fn list(session: &Session) -> Result<()> {
    let wallets = session.manager.list()?;
    if wallets.is_empty() {
        println!("{}", style("No wallets found.").yellow());
        return Ok(());
    }

    let selected = session.manager.selected()?.map(|record| record.id);
    for record in wallets {
        let marker = if Some(record.id) == selected { "*" } else { " " };
        println!(
            "{} {}  {}  {}",
            style(marker).green().bold(),
            record.id,
            style(&record.name).bold(),
            style(record.master_address()).cyan()
        );
    }
    Ok(())
}

pub fn show(session: &Session, id: Option<Uuid>, reveal: bool) -> Result<()> {
    let record = session.wallet(id)?;
    print_summary(&record);
    println!();
    for (symbol, address) in record.addresses() {
        let path = record
            .path(symbol)
            .map(ToString::to_string)
            .unwrap_or_default();
        println!("  {:<12} {:<22} {}", style(symbol).bold(), style(path).dim(), address);
    }

    if reveal {
        println!("\n{}", style("Recovery phrase:").yellow());
        println!("{}", record.mnemonic().phrase().as_str());
    }
    Ok(())
}

pub fn select(session: &Session, id: Uuid) -> Result<()> {
    session.manager.select(id)?;
    println!("Selected wallet {}", style(id).cyan());
    Ok(())
}

pub fn delete(session: &Session, id: Uuid, yes: bool) -> Result<()> {
    let record = session.manager.get(id)?;
    if !yes {
        if !std::io::stdin().is_terminal() {
            return Err(anyhow!("refusing to delete without --yes when stdin is not a terminal"));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete wallet '{}' ({})?", record.name, record.master_address()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("Cancelled.").dim());
            return Ok(());
        }
    }

    session.manager.delete(id)?;
    println!("{}", style("Wallet deleted").bold().green());
    Ok(())
}

pub fn add_asset(session: &Session, id: Option<Uuid>, symbol: &str, path: Option<&str>) -> Result<()> {
    let record = session.wallet(id)?;
    let symbol: AssetSymbol = symbol.parse().map_err(|e: String| anyhow!(e))?;
    let path = path
        .map(|raw| raw.parse::<DerivationPath>())
        .transpose()
        .map_err(|e| anyhow!("invalid derivation path: {e}"))?;

    let asset = session.manager.add_asset(record.id, &symbol, path)?;
    println!(
        "{} {}  {}  {}",
        style("Added").bold().green(),
        style(&asset.symbol).bold(),
        style(&asset.path).dim(),
        asset.address
    );
    Ok(())
}

fn print_summary(record: &WalletRecord) {
    println!("  id:      {}", record.id);
    println!("  name:    {}", style(&record.name).bold());
    println!("  master:  {}", style(record.master_address()).cyan());
    println!("  created: {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
}
