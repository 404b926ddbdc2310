/*
[INPUT]:  Transfer and auth subcommand arguments, configured endpoints
[OUTPUT]: Signed (and unless dry-run, submitted) transactions and auth proofs
[POS]:    CLI layer - commands that reach the network
[UPDATE]: When transaction or auth flows change
*/

use anyhow::{Context, Result, anyhow};
use console::style;
use uuid::Uuid;
use walletkit_core::{
    AddressFormat,
    AssetSymbol,
    AuthManager,
    AuthSigner,
    BackendClient,
    EvmJsonRpc,
    EvmTransactionBuilder,
    EvmTransferRequest,
    SolanaJsonRpc,
    SolanaTransactionBuilder,
    SolanaTransferRequest,
};

use super::Session;

fn parse_symbol(raw: &str) -> Result<AssetSymbol> {
    raw.parse().map_err(|e: String| anyhow!(e))
}

fn backend(session: &Session) -> Result<BackendClient> {
    let url = session
        .config
        .backend
        .url
        .as_deref()
        .context("backend.url is not configured")?;
    Ok(BackendClient::with_config(url, session.config.http.client_config())?)
}

/// Sign `master || nonce` offline, or run the full backend flow when no nonce is given
pub async fn sign_auth(session: &Session, id: Option<Uuid>, nonce: Option<String>) -> Result<()> {
    let record = session.wallet(id)?;

    let proof = match nonce {
        Some(nonce) => AuthSigner::from_record(&record)?.sign_challenge(&nonce)?,
        None if session.dry_run => {
            return Err(anyhow!("--dry-run needs --nonce; the backend flow registers the wallet"));
        }
        None => AuthManager::new(backend(session)?).authenticate(&record).await?,
    };

    println!("{}", serde_json::to_string_pretty(&proof)?);
    Ok(())
}

pub struct EvmSend {
    pub symbol: String,
    pub to: String,
    pub value: String,
    pub gas_limit: Option<u64>,
    pub data: Option<String>,
}

pub async fn send_evm(session: &Session, id: Option<Uuid>, args: EvmSend) -> Result<()> {
    let record = session.wallet(id)?;
    let symbol = parse_symbol(&args.symbol)?;
    if symbol.address_format() != AddressFormat::Evm {
        return Err(anyhow!("{symbol} is not an EVM asset"));
    }
    let from = record
        .address(&symbol)
        .with_context(|| format!("wallet has no {symbol} address; run `walletkit add-asset`"))?
        .to_string();

    let parent = symbol.alias_of();
    let network = session
        .config
        .evm_network(symbol.as_str(), parent.as_ref().map(AssetSymbol::as_str))
        .with_context(|| format!("no EVM network configured for {symbol}"))?;
    let rpc = EvmJsonRpc::with_config(&network.rpc_url, session.config.http.client_config())?;

    let mut request = EvmTransferRequest::new(args.to, args.value, network.chain_id);
    request.gas_limit = args.gas_limit;
    request.data = args.data;

    let built = EvmTransactionBuilder::build(&rpc, &from, request).await?;
    let signed = built.sign(&record, &symbol)?;
    println!("{} {}", style("hash:").dim(), signed.hash);

    if session.dry_run {
        println!("{} {}", style("raw:").dim(), signed.raw_hex);
        println!("{}", style("dry-run: not submitted").yellow());
        return Ok(());
    }

    let submitted = signed.submit(&rpc).await?;
    println!("{} {}", style("Submitted").bold().green(), submitted.id);
    Ok(())
}

pub struct SolanaSend {
    pub symbol: String,
    pub to: String,
    pub amount: String,
    pub sponsored: bool,
}

pub async fn send_sol(session: &Session, id: Option<Uuid>, args: SolanaSend) -> Result<()> {
    let record = session.wallet(id)?;
    let symbol = parse_symbol(&args.symbol)?;
    if !symbol.is_solana_family() {
        return Err(anyhow!("{symbol} is not a Solana asset"));
    }
    let from = record
        .address(&symbol)
        .with_context(|| format!("wallet has no {symbol} address; run `walletkit add-asset`"))?
        .to_string();

    let network = session
        .config
        .solana_network(symbol.as_str())
        .with_context(|| format!("no Solana network configured for {symbol}"))?;
    let rpc = SolanaJsonRpc::with_config(&network.rpc_url, session.config.http.client_config())?;

    let request = SolanaTransferRequest::new(args.to, args.amount);
    let built = if args.sponsored {
        SolanaTransactionBuilder::build_sponsored(&rpc, &backend(session)?, &from, request).await?
    } else {
        SolanaTransactionBuilder::build(&rpc, &from, request).await?
    };
    let lamports = built.lamports();
    let signed = built.sign(&record, &symbol)?;
    println!("{} {} lamports", style("amount:").dim(), lamports);

    if !signed.is_fully_signed() {
        println!(
            "{} {}",
            style("awaiting fee payer signature from").yellow(),
            signed.missing_signers().join(", ")
        );
        println!("{}", signed.to_base64()?);
        return Ok(());
    }

    if session.dry_run {
        println!("{} {}", style("signature:").dim(), signed.sender_signature());
        println!("{} {}", style("wire:").dim(), signed.to_base64()?);
        println!("{}", style("dry-run: not submitted").yellow());
        return Ok(());
    }

    let submitted = signed.submit(&rpc).await?;
    println!("{} {}", style("Submitted").bold().green(), submitted.id);
    Ok(())
}
