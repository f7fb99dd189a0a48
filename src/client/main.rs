// src/client/main.rs

use std::env;

use regist::activation_key::is_activation_key;
use regist::client::connection::ActivationClient;
use regist::client::request::build_request_for_raw_serial;
use regist::codec::Codec;
use regist::config::get_config;
use regist::errors::{RegistError, RegistResult};
use regist::protocol::ResponseToken;

/// Request an activation key from a running server.
///
/// Usage: `regist_client <host:port> <fingerprint> <raw-serial>`
///
/// Key material is taken from the same configuration sources as the server.
#[tokio::main(flavor = "current_thread")]
async fn main() -> RegistResult<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let [addr, fingerprint, raw_serial] = args.as_slice() else {
        return Err(RegistError::ConfigError(
            "usage: regist_client <host:port> <fingerprint> <raw-serial>".to_string(),
        ));
    };

    let config = get_config()?;
    let codec = Codec::from_config(&config.crypto)?;
    let line = build_request_for_raw_serial(&codec, fingerprint, raw_serial)?;

    let mut client = ActivationClient::connect(addr.as_str()).await?;
    let token = client.request(&line).await?;
    client.disconnect().await?;

    match token {
        ResponseToken::Activated(key) if is_activation_key(&key) => {
            println!("Activation key: {key}");
        }
        ResponseToken::Activated(other) => {
            return Err(RegistError::ProtocolError(format!(
                "unexpected response: {other}"
            )));
        }
        ResponseToken::Rejected(rejection) => {
            println!("Rejected ({}): {rejection}", rejection.code());
        }
    }
    Ok(())
}
