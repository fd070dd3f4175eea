use clap::{Parser, Subcommand};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use url::Url;

#[derive(Parser)]
#[command(name = "metaforica")]
#[command(about = "A CLI for importing Medium articles into the Metafórica blog")]
struct Cli {
    /// Base URL for the Metafórica service
    #[arg(long, default_value = "http://localhost:3000")]
    service_url: Url,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a public Medium article as a published post
    Import {
        /// URL of the Medium article
        url: String,
    },
    /// Inspect and manage stored posts
    Posts {
        #[command(subcommand)]
        command: PostsCommand,
    },
}

#[derive(Subcommand)]
enum PostsCommand {
    /// List posts, newest first
    List {
        /// Only posts with this status (draft or published)
        #[arg(short, long)]
        status: Option<String>,
        /// Text to search for
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show one post as JSON
    Get { id: i32 },
    /// Delete a post
    Delete { id: i32 },
}

#[derive(Serialize)]
struct ImportRequest {
    url: String,
}

#[derive(Deserialize)]
struct ImportResponse {
    message: String,
    post: PostSummary,
}

#[derive(Deserialize)]
struct PostSummary {
    id: i32,
    title: String,
    slug: Option<String>,
    status: String,
    publish_date: String,
}

#[derive(Deserialize)]
struct ListResponse {
    items: Vec<PostSummary>,
    total: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Import { url } => import_post(&client, &cli.service_url, url).await?,
        Commands::Posts { command } => match command {
            PostsCommand::List {
                status,
                query,
                limit,
            } => list_posts(&client, &cli.service_url, status, query, limit).await?,
            PostsCommand::Get { id } => get_post(&client, &cli.service_url, id).await?,
            PostsCommand::Delete { id } => delete_post(&client, &cli.service_url, id).await?,
        },
    }

    Ok(())
}

async fn import_post(client: &Client, service_url: &Url, url: String) -> Result<(), Box<dyn Error>> {
    let endpoint = service_url.join("api/v1/import/medium")?;

    let response = client
        .post(endpoint)
        .json(&ImportRequest { url })
        .send()
        .await?;

    let response = ensure_success(response).await?;
    let imported: ImportResponse = response.json().await?;
    println!("{}", imported.message);
    print_summary(&imported.post);
    Ok(())
}

async fn list_posts(
    client: &Client,
    service_url: &Url,
    status: Option<String>,
    query: Option<String>,
    limit: Option<u32>,
) -> Result<(), Box<dyn Error>> {
    let mut endpoint = service_url.join("api/v1/posts")?;
    {
        let mut pairs = endpoint.query_pairs_mut();
        if let Some(status) = &status {
            pairs.append_pair("status", status);
        }
        if let Some(query) = &query {
            pairs.append_pair("q", query);
        }
        if let Some(limit) = limit {
            pairs.append_pair("limit", &limit.to_string());
        }
    }

    let response = ensure_success(client.get(endpoint).send().await?).await?;
    let list: ListResponse = response.json().await?;
    for post in &list.items {
        print_summary(post);
    }
    println!("{} of {} posts", list.items.len(), list.total);
    Ok(())
}

async fn get_post(client: &Client, service_url: &Url, id: i32) -> Result<(), Box<dyn Error>> {
    let endpoint = service_url.join(&format!("api/v1/posts/{id}"))?;

    let response = ensure_success(client.get(endpoint).send().await?).await?;
    let post: Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&post)?);
    Ok(())
}

async fn delete_post(client: &Client, service_url: &Url, id: i32) -> Result<(), Box<dyn Error>> {
    let endpoint = service_url.join(&format!("api/v1/posts/{id}"))?;

    ensure_success(client.delete(endpoint).send().await?).await?;
    println!("Post {id} deleted");
    Ok(())
}

/// Passes 2xx responses through; anything else becomes an error so the
/// process exits non-zero.
async fn ensure_success(response: Response) -> Result<Response, Box<dyn Error>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    Err(request_failure(status, &body).into())
}

/// Uses the service's `error` field when the body has one.
fn request_failure(status: StatusCode, body: &str) -> String {
    let reason = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    if reason.is_empty() {
        format!("Request failed: {status}")
    } else {
        format!("Request failed: {status}: {reason}")
    }
}

fn print_summary(post: &PostSummary) {
    println!(
        "#{} [{}] {} {} ({})",
        post.id,
        post.status,
        post.publish_date,
        post.title,
        post.slug.as_deref().unwrap_or("-")
    );
}
