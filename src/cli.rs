use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use serde_json::Value;

use rgwadmin::util::{gen_secret_key, SECRET_KEY_LEN};
use rgwadmin::{
    BucketInfo, Config, CreateKey, CreateSubuser, CreateUser, MetadataType, ModifySubuser,
    ModifyUser, OutputFormat, QuotaSpec, QuotaType, RemoveKey, RgwAdmin, TrimUsage, UsageQuery,
    UserLookup,
};

use crate::output::{FetchProgress, Sink};

#[derive(Parser)]
#[command(name = "rgwadmin")]
#[command(author, version, about = "Ceph RADOS Gateway admin client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Write the result to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true, value_enum)]
    format: Option<FormatArg>,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Gateway address, host or host:port
    #[arg(long, env = "CEPH_SERVER")]
    server: Option<String>,

    #[arg(long, env = "CEPH_ACCESS_KEY")]
    access_key: Option<String>,

    #[arg(long, env = "CEPH_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Admin endpoint prefix
    #[arg(long)]
    admin: Option<String>,

    /// Use https (true) or plain http (false)
    #[arg(long, env = "CEPH_SECURE", action = ArgAction::Set)]
    secure: Option<bool>,

    /// Verify the gateway's TLS certificate
    #[arg(long, env = "CEPH_VERIFY", action = ArgAction::Set)]
    verify: Option<bool>,

    #[arg(long)]
    ca_bundle: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Table,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Table => OutputFormat::Table,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MetadataArg {
    User,
    Bucket,
    #[value(name = "bucket.instance")]
    BucketInstance,
}

impl From<MetadataArg> for MetadataType {
    fn from(value: MetadataArg) -> Self {
        match value {
            MetadataArg::User => MetadataType::User,
            MetadataArg::Bucket => MetadataType::Bucket,
            MetadataArg::BucketInstance => MetadataType::BucketInstance,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Users
    #[command(subcommand)]
    User(UserCommand),
    /// User and per-bucket quotas
    #[command(subcommand)]
    Quota(QuotaCommand),
    /// Subusers
    #[command(subcommand)]
    Subuser(SubuserCommand),
    /// S3 and Swift keys
    #[command(subcommand)]
    Key(KeyCommand),
    /// User capabilities
    #[command(subcommand)]
    Caps(CapsCommand),
    /// Buckets and objects
    #[command(subcommand)]
    Bucket(BucketCommand),
    /// Usage reports
    #[command(subcommand)]
    Usage(UsageCommand),
    /// Raw metadata entries
    #[command(subcommand)]
    Metadata(MetadataCommand),
    /// Print a random secret key
    GenSecret {
        #[arg(short, long, default_value_t = SECRET_KEY_LEN)]
        length: usize,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    Info {
        #[arg(long, conflicts_with = "access_key")]
        uid: Option<String>,
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        stats: bool,
        #[arg(long)]
        sync: bool,
    },
    List,
    Create {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        display_name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "s3")]
        key_type: String,
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        caps: Option<String>,
        /// Do not let the gateway generate a key pair
        #[arg(long)]
        no_generate_key: bool,
        #[arg(long, allow_negative_numbers = true)]
        max_buckets: Option<i64>,
        #[arg(long)]
        suspended: bool,
    },
    Modify {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "s3")]
        key_type: String,
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        caps: Option<String>,
        #[arg(long)]
        generate_key: bool,
        #[arg(long, allow_negative_numbers = true)]
        max_buckets: Option<i64>,
        #[arg(long, action = ArgAction::Set)]
        suspended: Option<bool>,
    },
    Remove {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        purge_data: bool,
    },
}

#[derive(Args)]
struct QuotaArgs {
    #[arg(long, allow_negative_numbers = true)]
    max_size_kb: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    max_objects: Option<i64>,
    #[arg(long, action = ArgAction::Set)]
    enabled: Option<bool>,
}

impl From<QuotaArgs> for QuotaSpec {
    fn from(args: QuotaArgs) -> Self {
        Self {
            max_size_kb: args.max_size_kb,
            max_objects: args.max_objects,
            enabled: args.enabled,
        }
    }
}

#[derive(Subcommand)]
enum QuotaCommand {
    Get {
        #[arg(long)]
        uid: String,
        /// `user` or `bucket`
        #[arg(long, default_value = "user")]
        quota_type: String,
    },
    Set {
        #[arg(long)]
        uid: String,
        #[arg(long, default_value = "user")]
        quota_type: String,
        #[command(flatten)]
        quota: QuotaArgs,
    },
    /// Quota of a single bucket
    SetBucket {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        bucket: String,
        #[command(flatten)]
        quota: QuotaArgs,
    },
}

#[derive(Subcommand)]
enum SubuserCommand {
    Create {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        subuser: Option<String>,
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        key_type: Option<String>,
        #[arg(long)]
        access: Option<String>,
        #[arg(long)]
        generate_secret: bool,
    },
    Modify {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        subuser: String,
        #[arg(long)]
        secret: Option<String>,
        #[arg(long, default_value = "swift")]
        key_type: String,
        #[arg(long)]
        access: Option<String>,
        #[arg(long)]
        generate_secret: bool,
    },
    Remove {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        subuser: String,
        #[arg(long)]
        keep_keys: bool,
    },
}

#[derive(Subcommand)]
enum KeyCommand {
    Create {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        subuser: Option<String>,
        #[arg(long, default_value = "s3")]
        key_type: String,
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        no_generate_key: bool,
    },
    Remove {
        #[arg(long)]
        access_key: String,
        #[arg(long)]
        key_type: Option<String>,
        #[arg(long)]
        uid: Option<String>,
        #[arg(long)]
        subuser: Option<String>,
    },
}

#[derive(Subcommand)]
enum CapsCommand {
    Add {
        #[arg(long)]
        uid: String,
        /// e.g. `usage=read;buckets=*`
        #[arg(long)]
        caps: String,
    },
    Remove {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        caps: String,
    },
}

#[derive(Subcommand)]
enum BucketCommand {
    List {
        /// Fetch usage and quota of every bucket
        #[arg(long)]
        stats: bool,
        /// Parallel requests when fetching stats
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },
    Info {
        #[arg(long)]
        bucket: Option<String>,
        #[arg(long)]
        uid: Option<String>,
        #[arg(long)]
        stats: bool,
    },
    Instances,
    CheckIndex {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        check_objects: bool,
        #[arg(long)]
        fix: bool,
    },
    Remove {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        purge_objects: bool,
    },
    Link {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        bucket_id: String,
        #[arg(long)]
        uid: String,
    },
    Unlink {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        uid: String,
    },
    RemoveObject {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        object: String,
    },
    Policy {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        object: Option<String>,
    },
}

#[derive(Subcommand)]
enum UsageCommand {
    Show {
        #[arg(long)]
        uid: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        show_entries: bool,
        #[arg(long)]
        show_summary: bool,
    },
    Trim {
        #[arg(long)]
        uid: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        remove_all: bool,
    },
}

#[derive(Subcommand)]
enum MetadataCommand {
    Get {
        #[arg(value_enum)]
        metadata_type: MetadataArg,
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        max_entries: Option<u64>,
        #[arg(long)]
        marker: Option<String>,
    },
    Put {
        #[arg(value_enum)]
        metadata_type: MetadataArg,
        #[arg(long)]
        key: String,
        /// File holding the JSON document
        #[arg(long)]
        file: PathBuf,
    },
    Delete {
        #[arg(value_enum)]
        metadata_type: MetadataArg,
        #[arg(long)]
        key: String,
    },
    Lock {
        #[arg(value_enum)]
        metadata_type: MetadataArg,
        #[arg(long)]
        key: String,
        #[arg(long)]
        lock_id: String,
        /// Lock duration in seconds
        #[arg(long)]
        length: u64,
    },
    Unlock {
        #[arg(value_enum)]
        metadata_type: MetadataArg,
        #[arg(long)]
        key: String,
        #[arg(long)]
        lock_id: String,
    },
}

impl Cli {
    /// File config overlaid with environment and command-line settings.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("Failed to load config")?;
        let args = &self.connection;
        let connection = &mut config.connection;

        if let Some(server) = &args.server {
            connection.server.clone_from(server);
        }
        if let Some(access_key) = &args.access_key {
            connection.access_key.clone_from(access_key);
        }
        if let Some(secret_key) = &args.secret_key {
            connection.secret_key.clone_from(secret_key);
        }
        if let Some(admin) = &args.admin {
            connection.admin.clone_from(admin);
        }
        if let Some(secure) = args.secure {
            connection.secure = secure;
        }
        if let Some(verify) = args.verify {
            connection.verify = verify;
        }
        if args.ca_bundle.is_some() {
            connection.ca_bundle.clone_from(&args.ca_bundle);
        }
        if args.timeout.is_some() {
            connection.timeout = args.timeout;
        }
        if let Some(format) = self.format {
            config.output.format = format.into();
        }
        config.output.pretty |= self.pretty;

        Ok(config)
    }

    pub async fn execute(self) -> Result<()> {
        let config = self.resolve_config()?;
        let sink = Sink {
            format: config.output.format,
            pretty: config.output.pretty,
            path: self.output.as_deref(),
        };

        if let Commands::GenSecret { length } = &self.command {
            return sink.emit_text(&gen_secret_key(*length));
        }

        // the CLI issues several calls for some commands, share the client
        let mut connection = config.connection;
        connection.pool_connections = true;
        let admin = RgwAdmin::connect(connection).context("Failed to set up RGW connection")?;
        info!("Connected to {}", admin.base_url());

        let result = match self.command {
            Commands::User(command) => execute_user(&admin, command).await?,
            Commands::Quota(command) => execute_quota(&admin, command).await?,
            Commands::Subuser(command) => execute_subuser(&admin, command).await?,
            Commands::Key(command) => execute_key(&admin, command).await?,
            Commands::Caps(command) => execute_caps(&admin, command).await?,
            Commands::Bucket(BucketCommand::List { stats: true, concurrency }) => {
                let buckets = fetch_bucket_stats(&admin, concurrency).await?;
                return sink.emit_buckets(&buckets);
            }
            Commands::Bucket(command) => execute_bucket(&admin, command).await?,
            Commands::Usage(command) => execute_usage(&admin, command).await?,
            Commands::Metadata(command) => execute_metadata(&admin, command).await?,
            Commands::GenSecret { .. } => None,
        };

        sink.emit(result.as_ref())
    }
}

async fn execute_user(admin: &RgwAdmin, command: UserCommand) -> Result<Option<Value>> {
    let result = match command {
        UserCommand::Info {
            uid,
            access_key,
            stats,
            sync,
        } => {
            let lookup = match (uid, access_key) {
                (Some(uid), _) => UserLookup::Uid(uid),
                (None, Some(key)) => UserLookup::AccessKey(key),
                (None, None) => UserLookup::Any,
            };
            admin.get_user(lookup, stats, sync).await?
        }
        UserCommand::List => admin.get_users().await?,
        UserCommand::Create {
            uid,
            display_name,
            email,
            key_type,
            access_key,
            secret_key,
            caps,
            no_generate_key,
            max_buckets,
            suspended,
        } => {
            let user = CreateUser {
                email,
                key_type: Some(key_type),
                access_key,
                secret_key,
                user_caps: caps,
                generate_key: !no_generate_key,
                max_buckets,
                suspended,
                ..CreateUser::new(uid, display_name)
            };
            admin.create_user(&user).await?
        }
        UserCommand::Modify {
            uid,
            display_name,
            email,
            key_type,
            access_key,
            secret_key,
            caps,
            generate_key,
            max_buckets,
            suspended,
        } => {
            let user = ModifyUser {
                display_name,
                email,
                key_type: Some(key_type),
                access_key,
                secret_key,
                user_caps: caps,
                generate_key,
                max_buckets,
                suspended,
                ..ModifyUser::new(uid)
            };
            admin.modify_user(&user).await?
        }
        UserCommand::Remove { uid, purge_data } => admin.remove_user(&uid, purge_data).await?,
    };
    Ok(result)
}

async fn execute_quota(admin: &RgwAdmin, command: QuotaCommand) -> Result<Option<Value>> {
    let result = match command {
        QuotaCommand::Get { uid, quota_type } => {
            let quota_type: QuotaType = quota_type.parse()?;
            admin.get_quota(&uid, quota_type).await?
        }
        QuotaCommand::Set {
            uid,
            quota_type,
            quota,
        } => {
            let quota_type: QuotaType = quota_type.parse()?;
            admin.set_user_quota(&uid, quota_type, quota.into()).await?
        }
        QuotaCommand::SetBucket { uid, bucket, quota } => {
            admin.set_bucket_quota(&uid, &bucket, quota.into()).await?
        }
    };
    Ok(result)
}

async fn execute_subuser(admin: &RgwAdmin, command: SubuserCommand) -> Result<Option<Value>> {
    let result = match command {
        SubuserCommand::Create {
            uid,
            subuser,
            access_key,
            secret_key,
            key_type,
            access,
            generate_secret,
        } => {
            if access_key.is_some() != secret_key.is_some() {
                warn!("Both --access-key and --secret-key are needed, ignoring the one given");
            }
            let subuser = CreateSubuser {
                subuser,
                access_key,
                secret_key,
                key_type,
                access,
                generate_secret,
                ..CreateSubuser::new(uid)
            };
            admin.create_subuser(&subuser).await?
        }
        SubuserCommand::Modify {
            uid,
            subuser,
            secret,
            key_type,
            access,
            generate_secret,
        } => {
            let subuser = ModifySubuser {
                secret,
                key_type,
                access,
                generate_secret,
                ..ModifySubuser::new(uid, subuser)
            };
            admin.modify_subuser(&subuser).await?
        }
        SubuserCommand::Remove {
            uid,
            subuser,
            keep_keys,
        } => admin.remove_subuser(&uid, &subuser, !keep_keys).await?,
    };
    Ok(result)
}

async fn execute_key(admin: &RgwAdmin, command: KeyCommand) -> Result<Option<Value>> {
    let result = match command {
        KeyCommand::Create {
            uid,
            subuser,
            key_type,
            access_key,
            secret_key,
            no_generate_key,
        } => {
            let key = CreateKey {
                subuser,
                key_type,
                access_key,
                secret_key,
                generate_key: !no_generate_key,
                ..CreateKey::new(uid)
            };
            admin.create_key(&key).await?
        }
        KeyCommand::Remove {
            access_key,
            key_type,
            uid,
            subuser,
        } => {
            let key = RemoveKey {
                key_type,
                uid,
                subuser,
                ..RemoveKey::new(access_key)
            };
            admin.remove_key(&key).await?
        }
    };
    Ok(result)
}

async fn execute_caps(admin: &RgwAdmin, command: CapsCommand) -> Result<Option<Value>> {
    let result = match command {
        CapsCommand::Add { uid, caps } => admin.add_capability(&uid, &caps).await?,
        CapsCommand::Remove { uid, caps } => admin.remove_capability(&uid, &caps).await?,
    };
    Ok(result)
}

async fn execute_bucket(admin: &RgwAdmin, command: BucketCommand) -> Result<Option<Value>> {
    let result = match command {
        BucketCommand::List { .. } => admin.get_buckets().await?,
        BucketCommand::Info { bucket, uid, stats } => {
            admin
                .get_bucket(bucket.as_deref(), uid.as_deref(), stats)
                .await?
        }
        BucketCommand::Instances => admin.get_bucket_instances().await?,
        BucketCommand::CheckIndex {
            bucket,
            check_objects,
            fix,
        } => admin.check_bucket_index(&bucket, check_objects, fix).await?,
        BucketCommand::Remove {
            bucket,
            purge_objects,
        } => admin.remove_bucket(&bucket, purge_objects).await?,
        BucketCommand::Link {
            bucket,
            bucket_id,
            uid,
        } => admin.link_bucket(&bucket, &bucket_id, &uid).await?,
        BucketCommand::Unlink { bucket, uid } => admin.unlink_bucket(&bucket, &uid).await?,
        BucketCommand::RemoveObject { bucket, object } => {
            admin.remove_object(&bucket, &object).await?
        }
        BucketCommand::Policy { bucket, object } => {
            admin.get_policy(&bucket, object.as_deref()).await?
        }
    };
    Ok(result)
}

async fn execute_usage(admin: &RgwAdmin, command: UsageCommand) -> Result<Option<Value>> {
    let result = match command {
        UsageCommand::Show {
            uid,
            start,
            end,
            show_entries,
            show_summary,
        } => {
            let usage = UsageQuery {
                uid,
                start,
                end,
                show_entries,
                show_summary,
            };
            admin.get_usage(&usage).await?
        }
        UsageCommand::Trim {
            uid,
            start,
            end,
            remove_all,
        } => {
            let trim = TrimUsage {
                uid,
                start,
                end,
                remove_all,
            };
            admin.trim_usage(&trim).await?
        }
    };
    Ok(result)
}

async fn execute_metadata(admin: &RgwAdmin, command: MetadataCommand) -> Result<Option<Value>> {
    let result = match command {
        MetadataCommand::Get {
            metadata_type,
            key,
            max_entries,
            marker,
        } => {
            admin
                .get_metadata(
                    metadata_type.into(),
                    key.as_deref(),
                    max_entries,
                    marker.as_deref(),
                )
                .await?
        }
        MetadataCommand::Put {
            metadata_type,
            key,
            file,
        } => {
            let document = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            serde_json::from_str::<Value>(&document)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            admin
                .put_metadata(metadata_type.into(), &key, document)
                .await?
        }
        MetadataCommand::Delete { metadata_type, key } => {
            admin.delete_metadata(metadata_type.into(), &key).await?
        }
        MetadataCommand::Lock {
            metadata_type,
            key,
            lock_id,
            length,
        } => {
            admin
                .lock_metadata(metadata_type.into(), &key, &lock_id, length)
                .await?
        }
        MetadataCommand::Unlock {
            metadata_type,
            key,
            lock_id,
        } => {
            admin
                .unlock_metadata(metadata_type.into(), &key, &lock_id)
                .await?
        }
    };
    Ok(result)
}

/// Lists all buckets and fetches their stats with bounded concurrency.
///
/// Buckets that vanish between listing and fetching are skipped.
async fn fetch_bucket_stats(admin: &RgwAdmin, concurrency: usize) -> Result<Vec<BucketInfo>> {
    let names: Vec<String> = match admin.get_buckets().await? {
        Some(value) => serde_json::from_value(value).context("Unexpected bucket list format")?,
        None => Vec::new(),
    };

    let progress = FetchProgress::start(names.len());
    let results: Vec<_> = stream::iter(names)
        .map(|name| {
            let progress = &progress;
            async move {
                let info = BucketInfo::fetch(admin, &name).await;
                progress.inc();
                (name, info)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut buckets = Vec::with_capacity(results.len());
    for (name, info) in results {
        match info {
            Ok(info) => buckets.push(info),
            Err(e) if e.is_code(&rgwadmin::ErrorCode::NoSuchBucket) => {
                warn!("Bucket {name} disappeared while fetching stats");
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to fetch stats for {name}")),
        }
    }
    progress.finish(buckets.len());

    buckets.sort_by(|a, b| a.bucket.cmp(&b.bucket));
    Ok(buckets)
}
