//! Declarative CRI configs for the check run.
//!
//! Every builder here is pure: the same call always yields an identical
//! config, so a rerun sends byte-identical requests to the runtime.

use crate::cri_api::{
    ContainerConfig, ContainerMetadata, DnsConfig, ImageSpec, KeyValue, PodSandboxConfig,
    PodSandboxMetadata,
};

/// Pod name, also used as the sandbox hostname.
pub const POD_NAME: &str = "env-demo";
/// Namespace the pod sandbox is created in.
pub const POD_NAMESPACE: &str = "default";
/// Container name inside the sandbox.
pub const CONTAINER_NAME: &str = "env-demo-container";
/// Image the container runs. Must ship `/bin/bash`.
pub const CONTAINER_IMAGE: &str = "nginx:1.14.2";
/// Prefix shared by every injected environment key.
pub const ENV_KEY_PREFIX: &str = "ASCII";

/// First printable, non-space ASCII code point.
const FIRST_CODE_POINT: u8 = 33;
/// Exclusive upper bound (127 is DEL).
const END_CODE_POINT: u8 = 127;

/// Number of injected environment variables.
pub const EXPECTED_ENV_COUNT: usize = (END_CODE_POINT - FIRST_CODE_POINT) as usize;

/// Build the pod sandbox config.
pub fn pod_sandbox_config() -> PodSandboxConfig {
    PodSandboxConfig {
        metadata: Some(PodSandboxMetadata {
            name: POD_NAME.to_string(),
            uid: String::new(),
            namespace: POD_NAMESPACE.to_string(),
            attempt: 0,
        }),
        hostname: POD_NAME.to_string(),
        dns_config: Some(DnsConfig::default()),
        ..Default::default()
    }
}

/// Build the container config carrying the ASCII environment set.
pub fn container_config() -> ContainerConfig {
    ContainerConfig {
        metadata: Some(ContainerMetadata {
            name: CONTAINER_NAME.to_string(),
            attempt: 0,
        }),
        image: Some(ImageSpec {
            image: CONTAINER_IMAGE.to_string(),
            ..Default::default()
        }),
        envs: ascii_envs(),
        stdin: false,
        stdin_once: false,
        tty: false,
        ..Default::default()
    }
}

/// One `ASCII<code>=<char>` entry per printable code point in `[33, 127)`,
/// in ascending order.
pub fn ascii_envs() -> Vec<KeyValue> {
    (FIRST_CODE_POINT..END_CODE_POINT)
        .map(|code| KeyValue {
            key: format!("{}{}", ENV_KEY_PREFIX, code),
            value: char::from(code).to_string(),
        })
        .collect()
}

/// Command executed in the container to count the injected variables.
pub fn diagnostic_command() -> Vec<String> {
    vec![
        "/bin/bash".to_string(),
        "-c".to_string(),
        format!("env | grep {} | wc -l", ENV_KEY_PREFIX),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_ascii_envs_count_and_bounds() {
        let envs = ascii_envs();
        assert_eq!(envs.len(), 94);
        assert_eq!(envs.len(), EXPECTED_ENV_COUNT);

        assert_eq!(envs[0].key, "ASCII33");
        assert_eq!(envs[0].value, "!");
        let last = envs.last().unwrap();
        assert_eq!(last.key, "ASCII126");
        assert_eq!(last.value, "~");
    }

    #[test]
    fn test_ascii_envs_ascending_single_chars() {
        for (i, env) in ascii_envs().iter().enumerate() {
            let code = 33 + i as u32;
            assert_eq!(env.key, format!("ASCII{}", code));
            assert_eq!(env.value.chars().count(), 1);
            assert_eq!(env.value.chars().next().map(u32::from), Some(code));
        }
    }

    #[test]
    fn test_ascii_envs_exclude_space_and_del() {
        let envs = ascii_envs();
        assert!(envs.iter().all(|e| e.value != " " && e.value != "\u{7f}"));
        assert!(!envs.iter().any(|e| e.key == "ASCII127"));
    }

    #[test]
    fn test_container_config_is_byte_identical_across_calls() {
        let first = container_config().encode_to_vec();
        let second = container_config().encode_to_vec();
        assert_eq!(first, second);
        assert_eq!(container_config(), container_config());
    }

    #[test]
    fn test_pod_sandbox_config_is_byte_identical_across_calls() {
        assert_eq!(
            pod_sandbox_config().encode_to_vec(),
            pod_sandbox_config().encode_to_vec()
        );
    }

    #[test]
    fn test_pod_sandbox_config_fields() {
        let config = pod_sandbox_config();
        let metadata = config.metadata.as_ref().unwrap();
        assert_eq!(metadata.name, "env-demo");
        assert_eq!(metadata.namespace, "default");
        assert_eq!(metadata.attempt, 0);
        assert_eq!(config.hostname, "env-demo");
        assert_eq!(config.dns_config, Some(DnsConfig::default()));
    }

    #[test]
    fn test_container_config_fields() {
        let config = container_config();
        assert_eq!(config.metadata.as_ref().unwrap().name, "env-demo-container");
        assert_eq!(config.image.as_ref().unwrap().image, "nginx:1.14.2");
        assert!(!config.stdin && !config.stdin_once && !config.tty);
        assert_eq!(config.envs, ascii_envs());
    }

    #[test]
    fn test_diagnostic_command() {
        assert_eq!(
            diagnostic_command(),
            vec!["/bin/bash", "-c", "env | grep ASCII | wc -l"]
        );
    }
}
