use std::io::{self, BufRead, Write};

use agentic_chat::{run_turn, ActiveAgent, AppConfig, ChatApp, TurnOutcome};
use chat_api::ChatApiClient;
use conversation_store::{ConversationStore, Role};

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env();
    let client = ChatApiClient::new(config.chat_api_config()).map_err(io::Error::other)?;
    let mut app = ChatApp::new(ConversationStore::new(&config.storage_dir));

    let agents = match client.list_active_agents().await {
        Ok(agents) => agents,
        Err(error) => {
            eprintln!("Failed to list active agents: {error}");
            return Ok(());
        }
    };
    let Some(agent) = agents.first() else {
        println!("No active agents are available.");
        return Ok(());
    };
    app.select_agent(ActiveAgent {
        id: agent.id,
        name: agent.name.clone(),
    });
    println!("Chatting with {} ({})", agent.name, agent.model);
    println!("Commands: /conversations, /open <n>, /delete <n>, /new, /quit");

    if let Some(conversation) = app.current_conversation() {
        print_history(&conversation.messages);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("you> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" => break,
            "/new" => {
                app.store().clear_current();
                println!("Started a new conversation.");
                continue;
            }
            "/conversations" => {
                let recent = app.recent_conversations();
                if recent.is_empty() {
                    println!("No conversations yet.");
                }
                for (index, conversation) in recent.iter().enumerate() {
                    println!(
                        "{index}: {} ({} messages, updated {})",
                        conversation.agent_name,
                        conversation.messages.len(),
                        conversation.updated_at
                    );
                }
                continue;
            }
            _ => {}
        }

        if let Some(index) = input.strip_prefix("/open ") {
            let recent = app.recent_conversations();
            match index.trim().parse::<usize>().ok().and_then(|i| recent.get(i)) {
                Some(conversation) => {
                    let id = conversation.id.clone();
                    if let Some(opened) = app.open_conversation(&id) {
                        print_history(&opened.messages);
                    }
                }
                None => println!("No such conversation."),
            }
            continue;
        }

        if let Some(index) = input.strip_prefix("/delete ") {
            let recent = app.recent_conversations();
            match index.trim().parse::<usize>().ok().and_then(|i| recent.get(i)) {
                Some(conversation) => {
                    let id = conversation.id.clone();
                    if app.delete_conversation(&id) {
                        println!("Deleted.");
                    } else {
                        println!("Nothing deleted.");
                    }
                }
                None => println!("No such conversation."),
            }
            continue;
        }

        let mut printed = 0usize;
        let outcome = run_turn(&mut app, &client, input, None, |preview: &str| {
            print!("{}", &preview[printed..]);
            printed = preview.len();
            let _ = io::stdout().flush();
        })
        .await;

        match outcome {
            TurnOutcome::Completed { .. } => println!(),
            TurnOutcome::Failed { message } => println!("\nError: {message}"),
            TurnOutcome::Cancelled => println!("\nCancelled."),
            TurnOutcome::Rejected => println!("Nothing sent."),
        }
    }

    Ok(())
}

fn print_history(messages: &[conversation_store::StoredMessage]) {
    for message in messages {
        let label = match message.role {
            Role::User => "you",
            Role::Assistant => "agent",
            Role::System => "system",
        };
        println!("{label}> {}", message.content);
    }
}
