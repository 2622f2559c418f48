use async_trait::async_trait;
use invite_models::{BotError, ChatKind, MemberStatus};
use invite_telegram::{
    AnswerCallbackQuery, Chat, ChatMember, EditMessageText, Message, SendMessage, TelegramApi,
    Update, User,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// What the bot said, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Sent(SendMessage),
    Edited(EditMessageText),
}

impl Outgoing {
    pub fn chat_id(&self) -> i64 {
        match self {
            Outgoing::Sent(m) => m.chat_id,
            Outgoing::Edited(m) => m.chat_id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Outgoing::Sent(m) => &m.text,
            Outgoing::Edited(m) => &m.text,
        }
    }

    pub fn keyboard_data(&self) -> Vec<String> {
        let markup = match self {
            Outgoing::Sent(m) => m.reply_markup.as_ref(),
            Outgoing::Edited(m) => m.reply_markup.as_ref(),
        };
        markup
            .map(|k| k.buttons().map(|b| b.callback_data.clone()).collect())
            .unwrap_or_default()
    }
}

struct MockState {
    me: User,
    chats: HashMap<i64, Chat>,
    counts: HashMap<i64, i64>,
    members: HashMap<(i64, i64), ChatMember>,
    admins: HashMap<i64, Vec<ChatMember>>,
    chat_errors: HashMap<i64, String>,
    member_errors: HashMap<(i64, i64), String>,
    count_errors: HashSet<i64>,
    unreachable: HashSet<i64>,
    outgoing: Vec<Outgoing>,
    answers: Vec<AnswerCallbackQuery>,
    updates: VecDeque<Result<Vec<Update>, String>>,
    polled_at: Vec<Instant>,
    next_message_id: i64,
}

/// In-memory stand-in for the Bot API.
pub struct MockTelegram {
    state: Mutex<MockState>,
}

impl MockTelegram {
    pub fn new(bot_id: i64) -> Self {
        Self {
            state: Mutex::new(MockState {
                me: User {
                    id: bot_id,
                    is_bot: true,
                    first_name: "InviteBot".to_string(),
                    last_name: None,
                    username: Some("invite_bot".to_string()),
                },
                chats: HashMap::new(),
                counts: HashMap::new(),
                members: HashMap::new(),
                admins: HashMap::new(),
                chat_errors: HashMap::new(),
                member_errors: HashMap::new(),
                count_errors: HashSet::new(),
                unreachable: HashSet::new(),
                outgoing: Vec::new(),
                answers: Vec::new(),
                updates: VecDeque::new(),
                polled_at: Vec::new(),
                next_message_id: 1000,
            }),
        }
    }

    pub fn bot_id(&self) -> i64 {
        self.state.lock().unwrap().me.id
    }

    pub fn me(&self) -> User {
        self.state.lock().unwrap().me.clone()
    }

    /// Registers a chat with the bot as an administrator of it.
    pub fn add_chat(&self, chat: Chat, member_count: i64) {
        let mut state = self.state.lock().unwrap();
        let bot = state.me.clone();
        state.members.insert(
            (chat.id, bot.id),
            ChatMember {
                status: MemberStatus::Administrator,
                user: bot,
            },
        );
        state.counts.insert(chat.id, member_count);
        state.chats.insert(chat.id, chat);
    }

    pub fn set_member(&self, chat_id: i64, user: &User, status: MemberStatus) {
        self.state.lock().unwrap().members.insert(
            (chat_id, user.id),
            ChatMember {
                status,
                user: user.clone(),
            },
        );
    }

    pub fn set_bot_status(&self, chat_id: i64, status: MemberStatus) {
        let me = self.state.lock().unwrap().me.clone();
        self.set_member(chat_id, &me, status);
    }

    pub fn add_admin(&self, chat_id: i64, user: &User) {
        self.state
            .lock()
            .unwrap()
            .admins
            .entry(chat_id)
            .or_default()
            .push(ChatMember {
                status: MemberStatus::Administrator,
                user: user.clone(),
            });
    }

    pub fn fail_chat(&self, chat_id: i64, description: &str) {
        self.state
            .lock()
            .unwrap()
            .chat_errors
            .insert(chat_id, description.to_string());
    }

    pub fn fail_member(&self, chat_id: i64, user_id: i64, description: &str) {
        self.state
            .lock()
            .unwrap()
            .member_errors
            .insert((chat_id, user_id), description.to_string());
    }

    pub fn fail_member_count(&self, chat_id: i64) {
        self.state.lock().unwrap().count_errors.insert(chat_id);
    }

    /// Makes every `sendMessage` to this chat fail with 403.
    pub fn block(&self, chat_id: i64) {
        self.state.lock().unwrap().unreachable.insert(chat_id);
    }

    pub fn push_updates(&self, batch: Vec<Update>) {
        self.state.lock().unwrap().updates.push_back(Ok(batch));
    }

    /// Queues `times` consecutive `getUpdates` transport failures.
    pub fn fail_polls(&self, times: usize) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..times {
            state.updates.push_back(Err("connection reset".to_string()));
        }
    }

    /// When each `getUpdates` call arrived, on the tokio clock.
    pub fn polled_at(&self) -> Vec<Instant> {
        self.state.lock().unwrap().polled_at.clone()
    }

    pub fn outgoing(&self) -> Vec<Outgoing> {
        self.state.lock().unwrap().outgoing.clone()
    }

    pub fn sent(&self) -> Vec<SendMessage> {
        self.outgoing()
            .into_iter()
            .filter_map(|o| match o {
                Outgoing::Sent(m) => Some(m),
                Outgoing::Edited(_) => None,
            })
            .collect()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<SendMessage> {
        self.sent().into_iter().filter(|m| m.chat_id == chat_id).collect()
    }

    /// Most recent text sent or edited into a chat.
    pub fn last_to(&self, chat_id: i64) -> Option<Outgoing> {
        self.outgoing()
            .into_iter()
            .rev()
            .find(|o| o.chat_id() == chat_id)
    }

    pub fn answers(&self) -> Vec<AnswerCallbackQuery> {
        self.state.lock().unwrap().answers.clone()
    }

    pub fn clear_outgoing(&self) {
        let mut state = self.state.lock().unwrap();
        state.outgoing.clear();
        state.answers.clear();
    }
}

fn not_found(method: &str, what: &str) -> BotError {
    BotError::telegram(method, Some(400), format!("Bad Request: {} not found", what))
}

#[async_trait]
impl TelegramApi for MockTelegram {
    async fn get_me(&self) -> Result<User, BotError> {
        Ok(self.state.lock().unwrap().me.clone())
    }

    async fn get_updates(&self, _offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<Update>, BotError> {
        let batch = {
            let mut state = self.state.lock().unwrap();
            state.polled_at.push(Instant::now());
            state.updates.pop_front()
        };
        match batch {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(reason)) => Err(BotError::Transport { reason }),
            None => {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, request: SendMessage) -> Result<Message, BotError> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable.contains(&request.chat_id) {
            return Err(BotError::telegram(
                "sendMessage",
                Some(403),
                "Forbidden: bot can't initiate conversation with a user",
            ));
        }

        state.next_message_id += 1;
        let chat = state.chats.get(&request.chat_id).cloned().unwrap_or(Chat {
            id: request.chat_id,
            kind: ChatKind::Private,
            title: None,
            username: None,
        });
        let message = Message {
            message_id: state.next_message_id,
            from: Some(state.me.clone()),
            chat,
            date: 0,
            text: Some(request.text.clone()),
            new_chat_members: Vec::new(),
            left_chat_member: None,
        };
        state.outgoing.push(Outgoing::Sent(request));
        Ok(message)
    }

    async fn edit_message_text(&self, request: EditMessageText) -> Result<(), BotError> {
        self.state
            .lock()
            .unwrap()
            .outgoing
            .push(Outgoing::Edited(request));
        Ok(())
    }

    async fn answer_callback_query(&self, request: AnswerCallbackQuery) -> Result<(), BotError> {
        self.state.lock().unwrap().answers.push(request);
        Ok(())
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Chat, BotError> {
        let state = self.state.lock().unwrap();
        if let Some(description) = state.chat_errors.get(&chat_id) {
            return Err(BotError::telegram("getChat", Some(400), description.clone()));
        }
        state
            .chats
            .get(&chat_id)
            .cloned()
            .ok_or_else(|| not_found("getChat", "chat"))
    }

    async fn get_chat_member(&self, chat_id: i64, user_id: i64) -> Result<ChatMember, BotError> {
        let state = self.state.lock().unwrap();
        if let Some(description) = state.member_errors.get(&(chat_id, user_id)) {
            return Err(BotError::telegram("getChatMember", Some(400), description.clone()));
        }
        state
            .members
            .get(&(chat_id, user_id))
            .cloned()
            .ok_or_else(|| not_found("getChatMember", "member"))
    }

    async fn get_chat_member_count(&self, chat_id: i64) -> Result<i64, BotError> {
        let state = self.state.lock().unwrap();
        if state.count_errors.contains(&chat_id) {
            return Err(BotError::telegram(
                "getChatMemberCount",
                Some(400),
                "Bad Request: not enough rights",
            ));
        }
        state
            .counts
            .get(&chat_id)
            .copied()
            .ok_or_else(|| not_found("getChatMemberCount", "chat"))
    }

    async fn get_chat_administrators(&self, chat_id: i64) -> Result<Vec<ChatMember>, BotError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .admins
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }
}
