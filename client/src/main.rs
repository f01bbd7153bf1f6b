//! `eventdesk`: terminal front end for the EventDesk client.
//!
//! Each invocation restores the session from the token file, runs one
//! command through the same reducers any other front end would use, and
//! tears the stores down before exiting.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use eventdesk_client::providers::{
    ConsoleNavigator, ConsoleNotifier, FileTokenStorage, HttpApi, Navigator,
};
use eventdesk_client::session::{SessionEnvironment, SessionManager};
use eventdesk_client::types::{
    Category, EventFilter, EventId, LoginRequest, Registration, Route, SignupRequest,
};
use eventdesk_client::views::{
    DashboardAction, DashboardReducer, DashboardState, EventDetailAction, EventDetailReducer,
    EventDetailState, EventListAction, EventListReducer, EventListState, ViewEnvironment,
};
use eventdesk_client::ClientConfig;
use eventdesk_core::environment::{Clock, SystemClock};
use eventdesk_runtime::Store;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Session = SessionManager<HttpApi, FileTokenStorage, ConsoleNotifier>;
type Views = ViewEnvironment<HttpApi, ConsoleNotifier, ConsoleNavigator, Session>;

/// Browse events and manage registrations.
#[derive(Debug, Parser)]
#[command(name = "eventdesk", version, about)]
struct Cli {
    /// API base URL (overrides EVENTDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List events, optionally filtered
    Events {
        /// Text to search in names and descriptions
        #[arg(long)]
        search: Option<String>,
        /// Category (conference, workshop, meetup, concert, sports, other)
        #[arg(long)]
        category: Option<Category>,
        /// Location text
        #[arg(long)]
        location: Option<String>,
    },
    /// Show one event
    Show {
        /// Event id
        id: String,
    },
    /// Sign in
    Login {
        /// Account email
        email: String,
        /// Account password
        password: String,
    },
    /// Create an account and sign in
    Signup {
        /// Display name
        name: String,
        /// Account email
        email: String,
        /// Account password
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your upcoming and past registrations
    Dashboard,
    /// Register for an event
    Register {
        /// Event id
        id: String,
    },
    /// Cancel your registration for an event
    Cancel {
        /// Event id
        id: String,
    },
    /// Open a page by path (`/events`, `/event/<id>`, `/dashboard`)
    Open {
        /// Page path
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventdesk=info,eventdesk_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("invalid configuration")?;
    if let Some(api_url) = cli.api_url {
        config = ClientConfig::new(api_url)?
            .with_token_path(config.token_path)
            .with_request_timeout(config.request_timeout);
    }
    info!(api_url = %config.api_url, token_path = %config.token_path.display(), "Configuration loaded");

    let api = HttpApi::new(&config)?;
    let session = SessionManager::new(SessionEnvironment::new(
        api.clone(),
        FileTokenStorage::new(config.token_path.clone()),
        ConsoleNotifier::new(),
    ));
    session.initialize().await?;

    let navigator = ConsoleNavigator::new();
    let views = ViewEnvironment::new(
        api,
        ConsoleNotifier::new(),
        navigator.clone(),
        session.clone(),
        Arc::new(SystemClock),
    );

    let outcome = run(cli.command, &session, views).await;
    session.teardown();

    if let Some(route) = navigator.take_last() {
        println!("→ {route}");
    }
    outcome
}

async fn run(command: Command, session: &Session, views: Views) -> anyhow::Result<()> {
    match command {
        Command::Events {
            search,
            category,
            location,
        } => {
            let filter = EventFilter {
                search: search.unwrap_or_default(),
                category,
                location: location.unwrap_or_default(),
            };
            list_events(filter, views).await
        },

        Command::Show { id } => {
            let state = event_detail(EventId::new(id), session, views, None).await?;
            print_event(&state, &SystemClock);
            Ok(())
        },

        Command::Register { id } => {
            let state = event_detail(
                EventId::new(id),
                session,
                views,
                Some(EventDetailAction::Register),
            )
            .await?;
            print_event(&state, &SystemClock);
            Ok(())
        },

        Command::Cancel { id } => {
            let state =
                event_detail(EventId::new(id), session, views, Some(EventDetailAction::Cancel))
                    .await?;
            print_event(&state, &SystemClock);
            Ok(())
        },

        Command::Login { email, password } => {
            if !session.login(LoginRequest::new(email, password)).await? {
                bail!("login failed");
            }
            Ok(())
        },

        Command::Signup {
            name,
            email,
            password,
        } => {
            if !session.register(SignupRequest::new(name, email, password)).await? {
                bail!("registration failed");
            }
            Ok(())
        },

        Command::Logout => Ok(session.logout().await?),

        Command::Whoami => {
            match session.current_user().await {
                Some(user) => println!("{} <{}>", user.name, user.email),
                None => println!("Not signed in"),
            }
            Ok(())
        },

        Command::Dashboard => open(Route::Dashboard, session, views).await,

        Command::Open { path } => {
            let Some(route) = Route::from_path(&path) else {
                bail!("unknown page {path}");
            };
            open(route, session, views).await
        },
    }
}

/// Render the page behind `route`; private pages send anonymous visitors to login.
async fn open(route: Route, session: &Session, views: Views) -> anyhow::Result<()> {
    match route.guard(session.is_authenticated().await) {
        Route::Events => list_events(EventFilter::default(), views).await,
        Route::EventDetail(id) => {
            let state = event_detail(id, session, views, None).await?;
            print_event(&state, &SystemClock);
            Ok(())
        },
        Route::Dashboard => dashboard(session, views).await,
        form @ (Route::Login | Route::Register) => {
            views.navigator.navigate(form);
            Ok(())
        },
    }
}

async fn list_events(filter: EventFilter, views: Views) -> anyhow::Result<()> {
    let mut state = EventListState::new();
    state.filter = filter;
    let store = Store::new(state, EventListReducer::new(), views);

    store.send(EventListAction::Load).await?.wait().await;
    let cards = store.state(EventListState::cards).await;
    store.teardown();

    if cards.is_empty() {
        println!("No events found");
    }
    for card in cards {
        println!(
            "{:<26} {:<32} {:<12} {} · {} · {} [{}]",
            card.id.as_str(),
            card.name,
            card.category,
            card.date.format("%Y-%m-%d %H:%M"),
            card.location,
            card.seats(),
            card.action_label(),
        );
    }
    Ok(())
}

/// Load the detail view, then run `command` against it once loaded.
async fn event_detail(
    event_id: EventId,
    session: &Session,
    views: Views,
    command: Option<EventDetailAction>,
) -> anyhow::Result<EventDetailState> {
    let viewer = session.viewer().await;
    let store = Store::new(EventDetailState::new(event_id, viewer), EventDetailReducer::new(), views);

    store.send(EventDetailAction::Load).await?.wait().await;
    let loaded = store.state(|s| s.event.is_some()).await;

    if let (true, Some(command)) = (loaded, command) {
        store.send(command).await?.wait().await;
    }

    let state = store.state(Clone::clone).await;
    store.teardown();
    Ok(state)
}

async fn dashboard(session: &Session, views: Views) -> anyhow::Result<()> {
    let store = Store::new(
        DashboardState::new(session.viewer().await),
        DashboardReducer::new(),
        views,
    );

    store.send(DashboardAction::Load).await?.wait().await;
    let state = store.state(Clone::clone).await;
    store.teardown();

    if state.viewer.is_none() {
        return Ok(());
    }

    println!("Upcoming");
    print_registrations(&state.registrations.upcoming);
    println!("Past");
    print_registrations(&state.registrations.past);
    Ok(())
}

fn print_registrations(registrations: &[Registration]) {
    if registrations.is_empty() {
        println!("  (none)");
    }
    for registration in registrations {
        println!(
            "  {:<26} {:<32} {}",
            registration.event.id.as_str(),
            registration.event.name,
            registration.event.date.format("%Y-%m-%d %H:%M"),
        );
    }
}

fn print_event(state: &EventDetailState, clock: &dyn Clock) {
    let Some(event) = &state.event else {
        return;
    };
    let now = clock.now();

    println!("{}", event.name);
    println!("  {} · {} · by {}", event.category, event.location, event.organizer);
    println!("  {}", event.date.format("%A %Y-%m-%d %H:%M UTC"));
    println!("  {}", event.availability().summary());
    if !event.description.is_empty() {
        println!();
        println!("{}", event.description);
    }
    println!();

    if let Some(affordance) = state.affordance(now) {
        if affordance.is_enabled() {
            println!("[{}]", affordance.label());
        } else {
            println!("({})", affordance.label());
        }
    }
}
