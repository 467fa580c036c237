use std::io::Write as _;

use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::console::{sty_g, sty_r, Console};

/// Sends a request while echoing `METHOD url ... status` to the console.
pub trait SendPretty {
    fn send_pretty(self, client: &Client, cnsl: &mut Console) -> reqwest::Result<Response>;
}

impl SendPretty for RequestBuilder {
    fn send_pretty(self, client: &Client, cnsl: &mut Console) -> reqwest::Result<Response> {
        let req = self.build()?;
        write!(cnsl, "{:7} {} ... ", req.method().as_str(), req.url()).unwrap_or(());
        let result = client.execute(req);
        match &result {
            Ok(res) if res.status().is_success() => writeln!(cnsl, "{}", sty_g(res.status())),
            Ok(res) => writeln!(cnsl, "{}", sty_r(res.status())),
            Err(_) => writeln!(cnsl, "{}", sty_r("failed")),
        }
        .unwrap_or(());
        result
    }
}

/// Renders a reqwest error with its whole source chain.
pub fn describe_error(err: reqwest::Error) -> String {
    format!("{:#}", anyhow::Error::new(err))
}
