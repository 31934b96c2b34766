/// Request context handed in by the host. Query-string, cookie and body
/// decoding happen outside the interpreter; these tables arrive already
/// split into key/value pairs and are only seeded into the superglobals.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub get: Vec<(Vec<u8>, Vec<u8>)>,
    pub post: Vec<(Vec<u8>, Vec<u8>)>,
    pub cookie: Vec<(Vec<u8>, Vec<u8>)>,
    pub server: Vec<(Vec<u8>, Vec<u8>)>,
    pub env: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Request {
    /// A CLI-shaped request: process environment, nothing else.
    pub fn from_process_env() -> Self {
        let env = std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned().into_bytes(),
                    v.to_string_lossy().into_owned().into_bytes(),
                )
            })
            .collect();
        Self {
            env,
            ..Self::default()
        }
    }
}
