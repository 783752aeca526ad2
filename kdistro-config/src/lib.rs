//! INI configuration loading, grounded in
//! `utils/utils.py::get_configuration` (a thin `configparser` wrapper) and
//! `master_kmngr.py::run_mngr`'s section/key reads. Every required key is
//! validated up front so a malformed file fails fast at startup, before any
//! TPM/CAN/MQTT resource is acquired.

mod error;

pub use error::ConfigError;

use std::path::Path;

/// `[Secrets]`: shared material and key sizing.
#[derive(Debug, Clone)]
pub struct SecretsConfig {
    pub shared_secret: String,
    pub ltk_size_bits: u32,
    pub stk_size_bits: u32,
    pub ext_pub_key: String,
}

/// `[CAN]`: bus channel and arbitration ID assignment.
#[derive(Debug, Clone)]
pub struct CanConfig {
    pub vbus: String,
    pub bitrate: u32,
    pub ltk_st: u32,
    pub stk_st: u32,
}

/// `[mqtt]`: broker connection.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub user: String,
    pub passwd: String,
    pub host: String,
    pub port: u16,
}

/// `[Timers]`: rotation cadence, in ticks of the Master's 1s loop.
#[derive(Debug, Clone, Copy)]
pub struct TimersConfig {
    pub ltk_cycle: u32,
    pub stk_cycle: u32,
}

/// `[Log]`: level and rotating-file-handler parameters.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub filename: String,
    pub max_bytes: u64,
    pub backup_count: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub secrets: SecretsConfig,
    pub can: CanConfig,
    pub mqtt: MqttConfig,
    pub timers: TimersConfig,
    pub log: LogConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = ini::Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let secrets = Self::parse_secrets(&ini)?;
        let can = Self::parse_can(&ini)?;
        let mqtt = Self::parse_mqtt(&ini)?;
        let timers = Self::parse_timers(&ini)?;
        let log = Self::parse_log(&ini)?;

        Ok(Self {
            secrets,
            can,
            mqtt,
            timers,
            log,
        })
    }

    fn parse_secrets(ini: &ini::Ini) -> Result<SecretsConfig, ConfigError> {
        const SECTION: &str = "Secrets";
        let props = section(ini, SECTION)?;
        Ok(SecretsConfig {
            shared_secret: required(props, SECTION, "shared_secret")?.to_string(),
            ltk_size_bits: parse_u32(props, SECTION, "ltk_size", 256)?,
            stk_size_bits: parse_u32(props, SECTION, "stk_size", 128)?,
            ext_pub_key: required(props, SECTION, "ext_pub_key")?.to_string(),
        })
    }

    fn parse_can(ini: &ini::Ini) -> Result<CanConfig, ConfigError> {
        const SECTION: &str = "CAN";
        let props = section(ini, SECTION)?;
        Ok(CanConfig {
            vbus: required(props, SECTION, "vbus")?.to_string(),
            bitrate: parse_u32(props, SECTION, "bitrate", 500_000)?,
            ltk_st: parse_hex_u32(props, SECTION, "ltk_st")?,
            stk_st: parse_hex_u32(props, SECTION, "stk_st")?,
        })
    }

    fn parse_mqtt(ini: &ini::Ini) -> Result<MqttConfig, ConfigError> {
        const SECTION: &str = "mqtt";
        let props = section(ini, SECTION)?;
        Ok(MqttConfig {
            user: required(props, SECTION, "user")?.to_string(),
            passwd: required(props, SECTION, "passwd")?.to_string(),
            host: required(props, SECTION, "host")?.to_string(),
            port: parse_u32(props, SECTION, "port", 1883)? as u16,
        })
    }

    fn parse_timers(ini: &ini::Ini) -> Result<TimersConfig, ConfigError> {
        const SECTION: &str = "Timers";
        let props = section(ini, SECTION)?;
        Ok(TimersConfig {
            ltk_cycle: parse_u32(props, SECTION, "ltk_cycle", 20)?,
            stk_cycle: parse_u32(props, SECTION, "stk_cycle", 5)?,
        })
    }

    fn parse_log(ini: &ini::Ini) -> Result<LogConfig, ConfigError> {
        const SECTION: &str = "Log";
        let props = section(ini, SECTION)?;
        Ok(LogConfig {
            level: required(props, SECTION, "level")?.to_string(),
            filename: required(props, SECTION, "filename")?.to_string(),
            max_bytes: parse_u32(props, SECTION, "maxBytes", 1_048_576)? as u64,
            backup_count: parse_u32(props, SECTION, "backupCount", 3)?,
        })
    }
}

fn section<'a>(ini: &'a ini::Ini, name: &'static str) -> Result<&'a ini::Properties, ConfigError> {
    ini.section(Some(name)).ok_or(ConfigError::MissingSection(name))
}

fn required<'a>(props: &'a ini::Properties, section: &'static str, key: &'static str) -> Result<&'a str, ConfigError> {
    props.get(key).ok_or(ConfigError::MissingKey { section, key })
}

fn parse_u32(
    props: &ini::Properties,
    section: &'static str,
    key: &'static str,
    default: u32,
) -> Result<u32, ConfigError> {
    match props.get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            section,
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_hex_u32(props: &ini::Properties, section: &'static str, key: &'static str) -> Result<u32, ConfigError> {
    let value = required(props, section, key)?;
    let trimmed = value.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(trimmed, 16).map_err(|_| ConfigError::InvalidValue {
        section,
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_config() -> String {
        r#"
[Secrets]
shared_secret = 01234567890123456789012345678901
stk_size = 128
ext_pub_key = /etc/kdistro/peer_pub.pem

[CAN]
vbus = vcan0
bitrate = 500000
ltk_st = FF400
stk_st = FF600

[mqtt]
user = kdistro
passwd = hunter2
host = localhost
port = 1883

[Timers]
ltk_cycle = 20
stk_cycle = 5

[Log]
level = info
filename = kdistro.log
maxBytes = 1048576
backupCount = 3
"#
        .to_string()
    }

    #[test]
    fn loads_a_complete_file() {
        let dir = tempfile_dir();
        let path = dir.join("kdistro.ini");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(sample_config().as_bytes())
            .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.can.ltk_st, 0xFF400);
        assert_eq!(cfg.can.stk_st, 0xFF600);
        assert_eq!(cfg.mqtt.port, 1883);
        assert_eq!(cfg.timers.ltk_cycle, 20);
        assert_eq!(cfg.secrets.shared_secret.len(), 32);
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let dir = tempfile_dir();
        let path = dir.join("broken.ini");
        let broken = sample_config().replace("shared_secret = 01234567890123456789012345678901\n", "");
        std::fs::File::create(&path).unwrap().write_all(broken.as_bytes()).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKey {
                section: "Secrets",
                key: "shared_secret"
            }
        ));
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("kdistro-config-test-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
