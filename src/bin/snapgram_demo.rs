use anyhow::{Context, Result, bail};
use serde::Serialize;
use snapgram_lib::shared::validation::{SignupForm, Validate};
use snapgram_lib::{
    AppConfig, HomeFeedView, InMemoryBackend, LikedPostsView, NewUser, PageView, SavedPostsView,
    SocialBackend, SocialClient, init_logging,
};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::runtime::Runtime;
use tracing::info;

const DEFAULT_USERS: usize = 3;
const DEFAULT_POSTS: usize = 12;

#[derive(Debug, Clone)]
struct CliOptions {
    output: Option<PathBuf>,
    pretty: bool,
    users: usize,
    posts: usize,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    generated_at: String,
    config: AppConfig,
    signed_up: String,
    pages_loaded: usize,
    feed_posts: usize,
    home: PageView,
    liked: PageView,
    saved: PageView,
    backend_calls: usize,
}

fn usage() -> &'static str {
    "Usage: snapgram_demo [--users <n>] [--posts <n>] [--output <path>] [--pretty]"
}

fn write_output(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

fn emit_payload(target: Option<&Path>, payload: &str) -> Result<()> {
    if let Some(path) = target {
        write_output(path, payload)?;
        println!("Report written to {}", path.display());
    } else {
        println!("{payload}");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(args)?;

    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(|err| anyhow::anyhow!("Invalid configuration: {err}"))?;

    let rt = Runtime::new().context("Failed to create Tokio runtime")?;
    let report = rt.block_on(run_demo(config, &options))?;
    let payload = to_json(&report, options.pretty)?;
    emit_payload(options.output.as_deref(), &payload)
}

async fn run_demo(config: AppConfig, options: &CliOptions) -> Result<DemoReport> {
    if options.users == 0 {
        bail!("--users must be greater than 0");
    }
    let backend = Arc::new(InMemoryBackend::new(&config.backend));
    let mut users = Vec::with_capacity(options.users);
    for n in 0..options.users {
        users.push(
            backend
                .seed_user(&format!("Member {n}"), &format!("member{n}"))
                .await,
        );
    }
    for n in 0..options.posts {
        let author = &users[n % users.len()];
        backend
            .seed_post(&author.id, &format!("Snapshot #{n} by {}", author.username))
            .await;
    }
    info!(users = users.len(), posts = options.posts, "backend seeded");

    let client = SocialClient::new(config.clone(), backend.clone() as Arc<dyn SocialBackend>);

    let form = SignupForm {
        name: "Demo Viewer".to_string(),
        username: "viewer".to_string(),
        email: "viewer@example.com".to_string(),
        password: "password123".to_string(),
    };
    form.validate()
        .map_err(|err| anyhow::anyhow!("Signup form rejected: {err}"))?;
    let viewer = client
        .mutations
        .create_user_account(NewUser::from(form))
        .await
        .context("Failed to create the demo account")?;
    backend.sign_in_as(&viewer.id).await;

    let recent = client
        .queries
        .get_recent_posts()
        .await
        .into_result()
        .context("Failed to load recent posts")?
        .unwrap_or_default();
    for post in recent.iter().take(2) {
        client.mutations.toggle_like(post, &viewer.id).await?;
    }
    if let Some(post) = recent.first() {
        client.mutations.save_post(&viewer.id, &post.id).await?;
    }

    let mut feed = client
        .queries
        .get_infinite_posts()
        .await
        .into_result()?
        .unwrap_or_default();
    while feed.has_next_page() {
        feed = client
            .queries
            .fetch_next_page()
            .await
            .into_result()?
            .unwrap_or_default();
    }

    // ホームの一覧はいいねで無効化されているので取り直す
    client.queries.get_recent_posts().await.into_result()?;
    client.queries.get_current_user().await.into_result()?;
    let home = HomeFeedView::render(
        &client.queries.recent_posts_snapshot().await,
        Some(&viewer.id),
    );
    let current_user = client.queries.current_user_snapshot().await;
    let liked = LikedPostsView::render(&current_user);
    let saved = SavedPostsView::render(&current_user);

    Ok(DemoReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        config,
        signed_up: viewer.username,
        pages_loaded: feed.page_count(),
        feed_posts: feed.posts().count(),
        home,
        liked,
        saved,
        backend_calls: backend.total_calls(),
    })
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut output: Option<PathBuf> = None;
    let mut pretty = false;
    let mut users = DEFAULT_USERS;
    let mut posts = DEFAULT_POSTS;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--output requires a path\n{}", usage()))?;
                output = Some(PathBuf::from(path));
            }
            "--pretty" => {
                pretty = true;
            }
            "--users" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--users requires a value\n{}", usage()))?;
                users = parse_count("--users", &value)?;
            }
            "--posts" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--posts requires a value\n{}", usage()))?;
                posts = parse_count("--posts", &value)?;
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => {
                bail!("Unknown argument: {other}\n{}", usage());
            }
        }
    }

    Ok(CliOptions {
        output,
        pretty,
        users,
        posts,
    })
}

fn parse_count(flag: &str, value: &str) -> Result<usize> {
    let parsed: usize = value
        .parse()
        .with_context(|| format!("Invalid {flag} '{value}'. Expected a positive integer."))?;
    if parsed == 0 {
        bail!("{flag} must be greater than 0");
    }
    Ok(parsed)
}
