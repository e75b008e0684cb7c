use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use welfare_client::board::{CommentStatus, CommentThread};
use welfare_client::chat::ChatPanel;
use welfare_client::filters::{REGIONS, SearchQuery, TARGETS};
use welfare_client::pagination::Paginator;
use welfare_client::{
    BoardPostSummary, CancelToken, ClientConfig, Credentials, Session, WelfareClient,
    WelfareClientError, WelfareDetail, WelfareListItem, display_date,
};

mod logging;
mod settings;

use logging::init_logging;
use settings::Settings;

const LOGIN_REQUIRED: &str =
    "Требуется вход: выполните `welfare-cli login --username ... --password ...`";

#[derive(Debug, Parser)]
#[command(name = "welfare-cli", version, about = "CLI клиент сервиса социальных программ")]
struct Cli {
    /// Адрес API (перекрывает WELFARE_API_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Регистрация пользователя.
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Вход пользователя.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Выход: удаляет сохранённый токен.
    Logout,
    /// Главная: популярные программы и последние посты.
    Home,
    /// Поиск программ (требует вход).
    Search {
        #[arg(long)]
        question: String,
        /// Регион, например `서울`.
        #[arg(long)]
        area: Option<String>,
        /// Целевая группа, например `청년`.
        #[arg(long)]
        target: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Подробности программы (требует вход).
    Welfare {
        #[arg(long)]
        id: String,
    },
    /// Вопросы чат-боту по программе (требует вход).
    ///
    /// `--question` можно указать несколько раз, вопросы уходят параллельно.
    Ask {
        #[arg(long)]
        id: String,
        #[arg(long, required = true)]
        question: Vec<String>,
    },
    /// Страница доски.
    Board {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Пост с комментариями (требует вход).
    Post {
        #[arg(long)]
        id: String,
    },
    /// Комментарий к посту (требует вход).
    Comment {
        #[arg(long)]
        id: String,
        #[arg(long)]
        content: String,
    },
    /// Доступные значения фильтров поиска.
    Filters,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let server = cli
        .server
        .map(normalize_server)
        .unwrap_or_else(|| settings.api_url.clone());
    let mut config = ClientConfig::new(server);
    if let Some(timeout) = settings.http_timeout {
        config = config.with_timeout(timeout);
    }

    let cancel = CancelToken::new();
    let client = WelfareClient::new(config, Session::file(&settings.token_file))
        .context("не удалось создать HTTP-клиент")?
        .with_cancel(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling requests");
            cancel.cancel();
        }
    });

    execute(cli.command, &client, &settings).await
}

async fn execute(command: Command, client: &WelfareClient, settings: &Settings) -> Result<()> {
    match command {
        Command::Signup { username, password } => {
            client
                .sign_up(&Credentials::new(username, password))
                .await
                .map_err(|err| failure("зарегистрироваться", err))?;
            println!("Регистрация прошла успешно. Теперь выполните вход.");
        }
        Command::Login { username, password } => {
            client
                .login(&Credentials::new(username, password))
                .await
                .map_err(|err| failure("войти", err))?;
            println!("Вход выполнен");
        }
        Command::Logout => {
            client.logout().map_err(|err| failure("выйти", err))?;
            println!("Вы вышли из аккаунта");
        }
        Command::Home => print_home(client).await,
        Command::Search {
            question,
            area,
            target,
            page,
        } => {
            if !require_login(client) {
                return Ok(());
            }
            let mut query = SearchQuery::new(question);
            if let Some(area) = area {
                query = query.with_area_label(&area);
            }
            if let Some(target) = target {
                query = query.with_target_label(&target);
            }

            let mut pages = client
                .search_pages(&query, settings.page_size)
                .await
                .map_err(|err| failure("выполнить поиск", err))?;
            pages.on_page_change(page);
            print_welfare_page(&pages);
        }
        Command::Welfare { id } => {
            if !require_login(client) {
                return Ok(());
            }
            let detail = client
                .welfare_detail(&id)
                .await
                .map_err(|err| failure("загрузить программу", err))?;
            print_detail(&detail);
        }
        Command::Ask { id, question } => {
            if !require_login(client) {
                return Ok(());
            }
            ask_questions(client, &id, &question).await;
        }
        Command::Board { page } => {
            let pages = client
                .board_pages(page)
                .await
                .map_err(|err| failure("загрузить доску", err))?;
            print_board_page(&pages);
        }
        Command::Post { id } => {
            if !require_login(client) {
                return Ok(());
            }
            let thread = CommentThread::open(client.clone(), id)
                .await
                .map_err(|err| failure("загрузить пост", err))?;
            print_thread(&thread);
        }
        Command::Comment { id, content } => {
            if !require_login(client) {
                return Ok(());
            }
            let mut thread = CommentThread::open(client.clone(), id)
                .await
                .map_err(|err| failure("загрузить пост", err))?;
            let sent = thread.submit(&content).await;
            print_thread(&thread);
            sent.map_err(|err| failure("отправить комментарий", err))?;
        }
        Command::Filters => print_filters(),
    }

    Ok(())
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn require_login(client: &WelfareClient) -> bool {
    if client.session().is_authenticated() {
        return true;
    }
    println!("{LOGIN_REQUIRED}");
    false
}

/// Ошибки ввода показываем как есть, сетевые и серверные сводим к одному
/// сообщению на действие.
fn failure_message(action: &str, err: &WelfareClientError) -> String {
    match err {
        WelfareClientError::Validation(message) => message.clone(),
        WelfareClientError::Cancelled => "операция прервана".to_string(),
        _ => format!("не удалось {action}"),
    }
}

fn failure(action: &str, err: WelfareClientError) -> anyhow::Error {
    if !err.is_local() {
        error!(action, error = %err, "command failed");
    }
    anyhow::anyhow!(failure_message(action, &err))
}

async fn print_home(client: &WelfareClient) {
    let (popular, recent) = tokio::join!(client.popular_welfare(), client.recent_posts());

    let status = if client.session().is_authenticated() {
        "выполнен"
    } else {
        "не выполнен"
    };
    println!("Вход: {status}");

    println!();
    println!("Последние посты");
    match recent {
        Ok(posts) => print_post_lines(&posts),
        Err(err) => println!("  {}", failure_message("загрузить посты", &err)),
    }

    println!();
    println!("Часто запрашиваемые программы");
    match popular {
        Ok(items) => print_welfare_lines(&items),
        Err(err) => println!("  {}", failure_message("загрузить программы", &err)),
    }
}

async fn ask_questions(client: &WelfareClient, id: &str, questions: &[String]) {
    let mut panel = ChatPanel::new(client.clone(), id);
    for question in questions {
        if let Err(err) = panel.ask(question) {
            println!("{}: {}", question.trim(), failure_message("задать вопрос", &err));
        }
    }

    while let Some(ticket) = panel.next_completion().await {
        if let Some(exchange) = panel.exchange(ticket) {
            println!("> {}", exchange.question());
            println!("  {}", exchange.answer());
        }
    }
}

fn print_welfare_lines(items: &[WelfareListItem]) {
    if items.is_empty() {
        println!("  (пусто)");
    }
    for item in items {
        println!("- [{}] {}", item.id, item.title);
    }
}

fn print_post_lines(posts: &[BoardPostSummary]) {
    if posts.is_empty() {
        println!("  (пусто)");
    }
    for post in posts {
        println!("- [{}] {} ({})", post.id, post.title, display_date(&post.created_at));
    }
}

fn print_welfare_page(pages: &Paginator<WelfareListItem>) {
    println!("Рекомендуемые программы");
    print_welfare_lines(pages.visible());
    println!("{}", pages.controls());
}

fn print_board_page(pages: &Paginator<BoardPostSummary>) {
    println!("Отзывы и вопросы");
    print_post_lines(pages.visible());
    println!("{}", pages.controls());
}

fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() {
        "нет данных"
    } else {
        value
    }
}

fn print_detail(detail: &WelfareDetail) {
    let tags: Vec<String> = detail.areas.iter().map(|area| format!("#{area}")).collect();
    println!("{} {}", detail.title, tags.join(" "));
    if let Some(updated_at) = &detail.updated_at {
        println!("обновлено: {}", display_date(updated_at));
    }
    println!("целевые группы: {}", or_missing(&detail.targets.join(", ")));
    println!("критерии: {}", or_missing(&detail.criteria));
    println!("содержание: {}", or_missing(&detail.content));
    println!("как подать заявку: {}", or_missing(&detail.apply_method));
    println!("телефон: {}", or_missing(&detail.tel));
    println!(
        "сайт: {}",
        or_missing(detail.reference_link.as_deref().unwrap_or_default())
    );
    println!("основание: {}", or_missing(&detail.reference));
}

fn comment_marker(status: CommentStatus) -> &'static str {
    match status {
        CommentStatus::Published => "",
        CommentStatus::Sending => " (отправляется)",
        CommentStatus::Failed => " (не отправлен)",
    }
}

fn print_thread(thread: &CommentThread) {
    let post = thread.post();
    println!("{} ({})", post.title, display_date(&post.created_at));
    println!("{}", post.content);
    println!();
    println!("Комментарии");

    let comments = thread.comments();
    if comments.is_empty() {
        println!("  (пусто)");
    }
    for (comment, status) in comments {
        let mine = if comment.is_mine { " [мой]" } else { "" };
        println!(
            "- {}{}{} ({})",
            comment.content,
            mine,
            comment_marker(status),
            display_date(&comment.created_at)
        );
    }
}

fn print_filters() {
    let regions: Vec<&str> = REGIONS.iter().map(|(label, _)| *label).collect();
    let targets: Vec<&str> = TARGETS.iter().map(|(label, _)| *label).collect();
    println!("--area: {}", regions.join(", "));
    println!("--target: {}", targets.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://example.com:8080".to_string());
        assert_eq!(s, "https://example.com:8080");
    }

    #[test]
    fn normalize_server_adds_http_scheme() {
        let s = normalize_server("127.0.0.1:8080".to_string());
        assert_eq!(s, "http://127.0.0.1:8080");
    }

    #[test]
    fn server_errors_collapse_to_generic_message() {
        let err = WelfareClientError::Status { status: 401 };
        assert_eq!(failure_message("загрузить доску", &err), "не удалось загрузить доску");

        let err = WelfareClientError::Status { status: 500 };
        assert_eq!(failure_message("загрузить доску", &err), "не удалось загрузить доску");
    }

    #[test]
    fn settled_comment_gets_generic_message() {
        assert_eq!(
            failure_message("отправить комментарий", &WelfareClientError::NotPending),
            "не удалось отправить комментарий"
        );
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = WelfareClientError::Validation("Введите логин и пароль.".to_string());
        assert_eq!(failure_message("войти", &err), "Введите логин и пароль.");
    }

    #[test]
    fn cancelled_has_own_message() {
        assert_eq!(
            failure_message("войти", &WelfareClientError::Cancelled),
            "операция прервана"
        );
    }

    #[test]
    fn or_missing_replaces_blank() {
        assert_eq!(or_missing("  "), "нет данных");
        assert_eq!(or_missing("129"), "129");
    }

    #[test]
    fn comment_marker_flags_unconfirmed_comments() {
        assert_eq!(comment_marker(CommentStatus::Published), "");
        assert!(comment_marker(CommentStatus::Failed).contains("не отправлен"));
    }

    #[test]
    fn require_login_rejects_anonymous_session() {
        let client = WelfareClient::new(ClientConfig::default(), Session::in_memory())
            .expect("client builds");
        assert!(!require_login(&client));

        client.session().sign_in("tok").expect("sign in");
        assert!(require_login(&client));
    }

    #[test]
    fn cli_parses_repeated_questions() {
        let cli = Cli::try_parse_from([
            "welfare-cli",
            "ask",
            "--id",
            "3",
            "--question",
            "a",
            "--question",
            "b",
        ])
        .expect("args parse");
        match cli.command {
            Command::Ask { id, question } => {
                assert_eq!(id, "3");
                assert_eq!(question, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
