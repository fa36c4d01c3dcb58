/// Default configuration constants used across the system.

/// Default secret store endpoint (loopback, standard Vault port).
pub const DEFAULT_STORE_ADDR: &str = "http://127.0.0.1:8200";

/// Default gateway port.
pub const DEFAULT_GATEWAY_PORT: u16 = 3000;

/// Default bind host.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default per-call timeout for store requests (10 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Payload written to the namespace by the bootstrap.
pub const DEFAULT_SEED_MESSAGE: &str = "Hello World";

/// Key shares and threshold requested at initialization. Single-share
/// scheme: no real threshold security, demo-grade deployments only.
pub const INIT_SHARE_COUNT: u8 = 1;
pub const INIT_THRESHOLD: u8 = 1;

/// Config file name stem searched in the working directory.
pub const CONFIG_FILE_STEM: &str = "vaultgate";
