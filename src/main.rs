use anyhow::{Context, anyhow, bail};
use shard_cluster::cluster::registry::RegistryBuilder;
use shard_cluster::config::{ClusterConfig, NodeSpec};

#[derive(Debug, Default)]
struct CliArgs {
    config_path: Option<String>,
    nodes: Vec<NodeSpec>,
    help: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args)?;
    if cli.help {
        eprintln!("Usage: {} [--config <file.json>] [--node <host[:port]>]...", args[0]);
        eprintln!("Example: {} --node 127.0.0.1:6379 --node [::1]:6380", args[0]);
        return Ok(());
    }

    let mut config = match cli.config_path {
        Some(path) => ClusterConfig::from_file(&path)?,
        None => ClusterConfig::default(),
    };
    config.nodes.extend(cli.nodes);
    if config.nodes.is_empty() {
        tracing::info!("No nodes given, using localhost");
        config.nodes.push(NodeSpec {
            host: "localhost".to_string(),
            port: None,
        });
    }

    let registry = RegistryBuilder::from_config(&config)?.build()?;

    let map = registry.map_named("key");
    let map1 = registry.map_named("key1");

    map.clear().await?;
    map1.clear().await?;

    for i in 0..2000 {
        map.put(&format!("field{}", i), &format!("value{}", i)).await?;
    }

    println!("{}", map.size().await?);
    println!("{}", map1.size().await?);

    map1.put_all(map.entries().await?).await?;

    println!("{}", map.size().await?);
    println!("{}", map1.size().await?);

    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut cli = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                cli.config_path = Some(flag_value(args, i)?.to_string());
                i += 2;
            }
            "--node" => {
                cli.nodes.push(parse_node(flag_value(args, i)?)?);
                i += 2;
            }
            "--help" | "-h" => {
                cli.help = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }
    Ok(cli)
}

fn flag_value(args: &[String], i: usize) -> anyhow::Result<&str> {
    match args.get(i + 1) {
        Some(value) if !value.starts_with("--") => Ok(value.as_str()),
        _ => bail!("{} needs a value", args[i]),
    }
}

/// Accepts `host`, `host:port`, `[v6]`, `[v6]:port` and a bare IPv6 address.
fn parse_node(raw: &str) -> anyhow::Result<NodeSpec> {
    let port_of = |port: &str| -> anyhow::Result<u16> {
        port.parse::<u16>()
            .with_context(|| format!("Invalid port in node address {}", raw))
    };

    if let Some(rest) = raw.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("Unclosed '[' in node address {}", raw))?;
        let port = match tail.strip_prefix(':') {
            Some(port) => Some(port_of(port)?),
            None if tail.is_empty() => None,
            None => bail!("Unexpected text after ']' in node address {}", raw),
        };
        return Ok(NodeSpec {
            host: host.to_string(),
            port,
        });
    }

    match raw.split_once(':') {
        Some((host, port)) if !port.contains(':') => Ok(NodeSpec {
            host: host.to_string(),
            port: Some(port_of(port)?),
        }),
        _ => Ok(NodeSpec {
            host: raw.to_string(),
            port: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("shard_cluster")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_node_forms() {
        let node = parse_node("10.0.0.1:6380").unwrap();
        assert_eq!((node.host.as_str(), node.port), ("10.0.0.1", Some(6380)));

        let node = parse_node("localhost").unwrap();
        assert_eq!((node.host.as_str(), node.port), ("localhost", None));

        let node = parse_node("[::1]:6380").unwrap();
        assert_eq!((node.host.as_str(), node.port), ("::1", Some(6380)));

        let node = parse_node("[::1]").unwrap();
        assert_eq!((node.host.as_str(), node.port), ("::1", None));

        let node = parse_node("fe80::1").unwrap();
        assert_eq!((node.host.as_str(), node.port), ("fe80::1", None));

        assert!(parse_node("10.0.0.1:port").is_err());
        assert!(parse_node("[::1").is_err());
    }

    #[test]
    fn test_flag_without_value_rejected() {
        assert!(parse_args(&args(&["--node"])).is_err());
        assert!(parse_args(&args(&["--config"])).is_err());
        assert!(parse_args(&args(&["--node", "--config", "c.json"])).is_err());
    }

    #[test]
    fn test_parse_args_collects_nodes() {
        let cli = parse_args(&args(&["--node", "a:1", "--config", "c.json", "--node", "b"])).unwrap();
        assert_eq!(cli.config_path.as_deref(), Some("c.json"));
        assert_eq!(cli.nodes.len(), 2);
        assert_eq!(cli.nodes[1].port, None);
        assert!(!cli.help);

        assert!(parse_args(&args(&["-h"])).unwrap().help);
    }
}
