//! Interactive commands.

use std::time::Duration;

use murmur_server::{domain::ClientName, infrastructure::dto::websocket::DeliveredMessageDto};
use murmur_shared::time::millis_to_local_clock;

use crate::{
    address::ServerAddr,
    api::ApiClient,
    error::ClientError,
    prompt::{LineReader, is_quit, read_line},
    socket::{Deliveries, open_chat, open_listener},
};

/// How long to wait for the server's Close reply when quitting
const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub addr: ServerAddr,
    /// Prefix deliveries with the hub's local receive time
    pub show_timestamps: bool,
}

/// `chat`: a bidirectional session; every typed line is broadcast.
pub async fn run_chat(options: &ClientOptions, name: Option<String>) -> Result<(), ClientError> {
    println!("type :q to quit");
    let name = resolve_name(name).await?;

    let (mut sender, deliveries) = open_chat(&options.addr, &name).await?;
    let mut print_task = tokio::spawn(print_deliveries(deliveries, options.show_timestamps));
    let mut lines = LineReader::spawn("Message: ");

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Some(line) if is_quit(&line) => break,
                Some(line) => sender.send(&line).await?,
                None => break,
            },
            _ = &mut print_task => return Ok(()),
        }
    }

    println!("closing");
    if let Err(e) = sender.close().await {
        tracing::debug!("Failed to close the session: {}", e);
    }
    let _ = tokio::time::timeout(CLOSE_GRACE, print_task).await;
    Ok(())
}

/// `listen`: receive over a listener and send each line with a one-shot submit.
pub async fn run_listen(options: &ClientOptions, name: Option<String>) -> Result<(), ClientError> {
    println!("type :q to quit");
    let name = resolve_name(name).await?;

    let api = ApiClient::new(options.addr.clone());
    let (listener, deliveries) = open_listener(&options.addr, &name).await?;
    let mut print_task = tokio::spawn(print_deliveries(deliveries, options.show_timestamps));
    let mut lines = LineReader::spawn("Message: ");

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Some(line) if is_quit(&line) => break,
                Some(line) => match api.submit(&name, &line).await {
                    Ok(delivered) => tracing::debug!("Message queued for {} client(s)", delivered),
                    Err(e @ ClientError::NotSubscribed(_)) => println!("{e}"),
                    Err(e) => return Err(e),
                },
                None => break,
            },
            _ = &mut print_task => return Ok(()),
        }
    }

    println!("closing");
    if let Err(e) = listener.close().await {
        tracing::debug!("Failed to close the listener: {}", e);
    }
    let _ = tokio::time::timeout(CLOSE_GRACE, print_task).await;
    Ok(())
}

/// `names`: print every connected name, one per line.
pub async fn run_names(options: &ClientOptions) -> Result<(), ClientError> {
    let names = ApiClient::new(options.addr.clone()).names().await?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Name from the command line, or prompted for until it is valid.
async fn resolve_name(name: Option<String>) -> Result<String, ClientError> {
    if let Some(name) = name {
        ClientName::try_from(name.as_str())?;
        return Ok(name);
    }
    loop {
        let name = read_line("Enter your name: ").await?;
        match ClientName::try_from(name.as_str()) {
            Ok(_) => return Ok(name),
            Err(e) => println!("{e}"),
        }
    }
}

async fn print_deliveries(mut deliveries: Deliveries, show_timestamps: bool) {
    while let Some(delivery) = deliveries.next().await {
        match delivery {
            Ok(delivered) => println!("{}", format_delivery(&delivered, show_timestamps)),
            Err(e) => {
                println!("Server disconnected badly: {e}");
                return;
            }
        }
    }
    println!("Server disconnected");
}

/// `from: message`, optionally prefixed with `[HH:MM:SS]`
pub fn format_delivery(delivered: &DeliveredMessageDto, show_timestamps: bool) -> String {
    let line = format!("{}: {}", delivered.message.from, delivered.message.message);
    match show_timestamps
        .then(|| millis_to_local_clock(delivered.timestamp))
        .flatten()
    {
        Some(clock) => format!("[{clock}] {line}"),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use murmur_server::infrastructure::dto::websocket::ChatMessageDto;

    use super::*;

    fn delivered(from: &str, message: &str) -> DeliveredMessageDto {
        DeliveredMessageDto {
            timestamp: 1_700_000_000_000,
            message: ChatMessageDto {
                from: from.to_string(),
                message: message.to_string(),
            },
        }
    }

    #[test]
    fn test_format_delivery() {
        assert_eq!(format_delivery(&delivered("rouz", "Hello"), false), "rouz: Hello");
    }

    #[test]
    fn test_format_delivery_with_timestamp() {
        let line = format_delivery(&delivered("igor", "hi"), true);

        // [HH:MM:SS] igor: hi
        assert!(line.starts_with('['));
        assert_eq!(&line[9..], "] igor: hi");
    }
}
