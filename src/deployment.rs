use alloy_primitives::Address;
use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENT_FILE: &str = "deployment.json";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Polygon,
    Mumbai,
    Local,
}

impl DeploymentEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Polygon => "polygon",
            DeploymentEnv::Mumbai => "mumbai",
            DeploymentEnv::Local => "local",
        }
    }

    pub fn chain_id(self) -> u64 {
        match self {
            DeploymentEnv::Polygon => 137,
            DeploymentEnv::Mumbai => 80001,
            DeploymentEnv::Local => 31337,
        }
    }

    pub fn default_rpc_url(self) -> &'static str {
        match self {
            DeploymentEnv::Polygon => "https://polygon-rpc.com",
            DeploymentEnv::Mumbai => "https://rpc-mumbai.maticvigil.com",
            DeploymentEnv::Local => "http://localhost:8545",
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Polygon => "Polygon Mainnet",
            DeploymentEnv::Mumbai => "Polygon Mumbai",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

/// Addresses of one deployment of the three contracts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployed_at: String,
    pub token_address: Address,
    pub random_box_address: Address,
    pub card_game_address: Address,
    #[serde(default)]
    pub entry_fee_recipient: Option<Address>,
    #[serde(default)]
    pub token_symbol: Option<String>,
    #[serde(default)]
    pub unit_price: Option<String>,
}

impl DeploymentRecord {
    pub fn new(
        token_address: Address,
        random_box_address: Address,
        card_game_address: Address,
    ) -> Self {
        Self {
            deployed_at: Utc::now().to_rfc3339(),
            token_address,
            random_box_address,
            card_game_address,
            entry_fee_recipient: None,
            token_symbol: None,
            unit_price: None,
        }
    }
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        Self::at(Path::new(DEPLOYMENTS_ROOT), env)
    }

    pub fn at(root: &Path, env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(root, env)?;
        Ok(Self { path })
    }

    pub fn load(&self) -> Result<Option<DeploymentRecord>> {
        let data = fs::read(&self.path).wrap_err("Failed to read deployment record")?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let record = serde_json::from_slice::<DeploymentRecord>(&data)
            .wrap_err("Failed to parse deployment record JSON")?;
        Ok(Some(record))
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)
            .wrap_err("Failed to serialize deployment record")?;
        fs::write(&self.path, json).wrap_err("Failed to write deployment record")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn ensure_structure() -> Result<()> {
    for env in [
        DeploymentEnv::Polygon,
        DeploymentEnv::Mumbai,
        DeploymentEnv::Local,
    ] {
        let _ = ensure_store(Path::new(DEPLOYMENTS_ROOT), env)?;
    }
    Ok(())
}

fn ensure_store(root: &Path, env: DeploymentEnv) -> Result<PathBuf> {
    let env_dir = root.join(env.dir_name());
    if !env_dir.exists() {
        fs::create_dir_all(&env_dir).wrap_err_with(|| {
            format!("Failed to create {} directory", env_dir.display())
        })?;
    }

    let file_path = env_dir.join(DEPLOYMENT_FILE);
    if !file_path.exists() {
        fs::File::create(&file_path).wrap_err_with(|| {
            format!(
                "Failed to create deployment record file for {} at {:?}",
                env, file_path
            )
        })?;
    }

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn load__returns_none_for_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStore::at(dir.path(), DeploymentEnv::Mumbai).unwrap();
        assert!(store.path().ends_with("mumbai/deployment.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save__round_trips_through_the_store() {
        // given
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStore::at(dir.path(), DeploymentEnv::Local).unwrap();
        let record = DeploymentRecord::new(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
        );

        // when
        store.save(&record).unwrap();

        // then
        let reopened = DeploymentStore::at(dir.path(), DeploymentEnv::Local).unwrap();
        assert_eq!(reopened.load().unwrap(), Some(record));
    }
}
