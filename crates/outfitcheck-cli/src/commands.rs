//! Command implementations.
//!
//! `App` wires the core together the same way a mobile shell would: one
//! token vault shared by the session store and the API client, with the
//! session store installed as the client's logout handler.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use futures::future::join_all;
use tracing::warn;

use outfitcheck_core::models::{NewLoggedOutfit, NewUser};
use outfitcheck_core::utils::{donation_suggestion, format_last_used};
use outfitcheck_core::{ApiClient, Config, SessionState, SessionStore, UserId};

use crate::notifier::StderrNotifier;

pub struct App {
    config: Config,
    session: Arc<SessionStore>,
    api: ApiClient,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let vault = config.token_vault()?;
        let session = Arc::new(SessionStore::new(vault.clone(), Arc::new(StderrNotifier)));
        let api = ApiClient::new(config.api_base_url(), vault)?
            .with_logout_handler(session.logout_handler());

        Ok(Self {
            config,
            session,
            api,
        })
    }

    pub fn api_base_url(&self) -> &str {
        self.api.base_url()
    }

    pub async fn initialize(&self) {
        self.session.initialize().await;
    }

    /// Numeric id of the signed-in user, or an error telling them to sign in
    fn current_user(&self) -> Result<i64> {
        let Some(user_id) = self.session.user_id() else {
            bail!("Not signed in. Run `outfitcheck login <email>` first.");
        };
        numeric_id(&user_id)
    }

    pub async fn status(&self) -> Result<()> {
        match self.session.state() {
            SessionState::LoggedIn(user_id) => {
                let profile = self.api.user_profile(numeric_id(&user_id)?).await?;
                println!("Signed in as {} ({})", profile.display_name(), self.api_base_url());
            }
            SessionState::LoggedOut | SessionState::Uninitialized => {
                println!("Not signed in ({})", self.api_base_url());
            }
        }
        Ok(())
    }

    pub async fn login(&self, email: Option<&str>) -> Result<()> {
        let email = match email.or(self.config.last_email.as_deref()) {
            Some(email) => email.to_string(),
            None => bail!("No email given and none remembered. Usage: outfitcheck login <email>"),
        };
        let password = rpassword::prompt_password("Password: ")?;

        let token = self.api.login(&email, &password).await?;
        let user_id = self
            .session
            .login(&token)
            .await
            .context("Server returned a token this client cannot use")?;

        let mut config = self.config.clone();
        config.last_email = Some(email.clone());
        if let Err(e) = config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!("Signed in as {} (user {})", email, user_id);
        Ok(())
    }

    pub async fn register(&self, email: &str, username: &str) -> Result<()> {
        let password = rpassword::prompt_password("Choose a password: ")?;
        let confirm = rpassword::prompt_password("Repeat password: ")?;
        if password != confirm {
            bail!("Passwords do not match");
        }

        let user = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password,
        };
        let profile = self.api.register(&user).await?;
        println!(
            "Account {} created. Sign in with `outfitcheck login {}`.",
            profile.display_name(),
            email
        );
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.logout(false).await;
        println!("Signed out");
        Ok(())
    }

    pub async fn wardrobe(&self) -> Result<()> {
        let user_id = self.current_user()?;
        let items = self.api.clothing_items(user_id).await?;
        if items.is_empty() {
            println!("Your wardrobe is empty");
            return Ok(());
        }

        let last_used = join_all(items.iter().map(|item| self.api.last_used(item.id))).await;
        let today = Local::now().date_naive();

        for (item, last) in items.iter().zip(last_used) {
            // A failed lookup only costs the "last worn" column
            let last = last.unwrap_or_else(|e| {
                warn!(item = item.id, error = %e, "Failed to fetch last-used date");
                None
            });
            let worn = last
                .map(|d| format_last_used(d, today))
                .unwrap_or_else(|| "never worn".to_string());
            let laundry = if item.in_laundry { " [laundry]" } else { "" };
            println!("{:>6}  {}{}  - {}", item.id, item.label(), laundry, worn);
            if let Some(hint) = donation_suggestion(last, today) {
                println!("        {}", hint);
            }
        }
        Ok(())
    }

    pub async fn laundry(&self, item: &str) -> Result<()> {
        self.current_user()?;
        let item = self.api.toggle_laundry(parse_id(item)?).await?;
        let state = if item.in_laundry { "in the laundry" } else { "back in the wardrobe" };
        println!("{} is {}", item.label(), state);
        Ok(())
    }

    pub async fn outfits(&self) -> Result<()> {
        let user_id = self.current_user()?;
        let outfits = self.api.outfits(user_id).await?;
        if outfits.is_empty() {
            println!("No outfits yet");
        }
        for outfit in &outfits {
            let visibility = if outfit.visible { "public" } else { "private" };
            println!(
                "{:>6}  {} ({} items, {})",
                outfit.id,
                outfit.display_name(),
                outfit.clothing_items.len(),
                visibility
            );
        }
        Ok(())
    }

    pub async fn wear(&self, outfit: &str, date: Option<&str>) -> Result<()> {
        let user_id = self.current_user()?;
        let date = match date {
            Some(date) => parse_date(date)?,
            None => Local::now().date_naive(),
        };
        let entry = NewLoggedOutfit {
            outfit_id: parse_id(outfit)?,
            date,
            user_id,
        };
        self.api.log_outfit(&entry).await?;
        println!("Outfit logged for {}", date);
        Ok(())
    }

    pub async fn today(&self) -> Result<()> {
        let user_id = self.current_user()?;
        let today = Local::now().date_naive();
        match self.api.outfit_worn_on(user_id, today).await? {
            Some(items) => {
                println!("Wearing today:");
                for item in &items {
                    println!("{:>6}  {}", item.id, item.label());
                }
            }
            None => println!("Nothing logged for today. Try `outfitcheck wear <outfit-id>`."),
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<()> {
        let user_id = self.current_user()?;
        let (worn, used, neglected) = futures::try_join!(
            self.api.most_worn_outfits(user_id),
            self.api.most_used_items(user_id),
            self.api.neglected_items(user_id),
        )?;

        println!("Most worn outfits:");
        for usage in &worn {
            println!("  {:>3}x  {}", usage.usage_count, usage.outfit.display_name());
        }
        println!("Most used items:");
        for usage in &used {
            println!("  {:>3}x  {}", usage.usage_count, usage.item.label());
        }
        println!("Neglected items:");
        for item in &neglected {
            println!("        {}", item.label());
        }
        Ok(())
    }

    pub async fn feed(&self) -> Result<()> {
        let user_id = self.current_user()?;
        let posts = self.api.posts(user_id).await?;
        for post in &posts {
            let author = post.username.as_deref().unwrap_or("someone");
            let liked = if post.liked_by_current_user { "♥" } else { "♡" };
            println!(
                "{} {} {}  {}",
                liked,
                post.like_count,
                author,
                post.caption.as_deref().unwrap_or("")
            );
            if !post.hashtags.is_empty() {
                println!("    #{}", post.hashtags.join(" #"));
            }
        }
        Ok(())
    }
}

/// The backend identifies users by number; tokens carry it as an opaque id
fn numeric_id(user_id: &UserId) -> Result<i64> {
    user_id
        .as_str()
        .parse()
        .with_context(|| format!("User id {} is not numeric", user_id))
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .with_context(|| format!("'{}' is not a valid id", raw))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("'{}' is not a date (expected YYYY-MM-DD)", raw))
}
