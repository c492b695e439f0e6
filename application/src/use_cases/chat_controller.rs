//! Chat controller.
//!
//! [`ChatController`] is the single facade a surface talks to. It owns the
//! [`SessionState`] and the handlers, reaches the outside world through the
//! ports, and reports every visible change as a [`ChatEvent`].
//!
//! The controller is driven through `&mut self`, so exactly one command runs
//! at a time. Event-driven surfaces can use the split API
//! ([`ChatController::begin_send`] / [`ChatController::apply_stream_event`])
//! and feed late or duplicate stream events safely.

use super::attachment::{AttachmentError, AttachmentPipeline};
use super::confirmation::{AnswerOutcome, ConfirmationHandler};
use super::dispatcher::{
    Dispatch, DispatchSettings, DispatchTicket, OutgoingImage, SendRejection, SendRequest,
    StreamingDispatcher,
};
use super::follow_up::FollowUpHandler;
use super::session_state::SessionState;
use crate::config::ChatConfig;
use crate::ports::attachment_uploader::AttachmentUploader;
use crate::ports::chat_event::ChatEvent;
use crate::ports::chat_transport::{ChatTransport, TransportError};
use crate::ports::confirmation_gateway::{ConfirmationError, ConfirmationGateway};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::image_processor::ImageProcessor;
use crate::ports::progress::{ChatProgressNotifier, NoChatProgress};
use crate::ports::session_gateway::{PersistenceError, SessionGateway};
use nurture_domain::{
    AttachmentState, ConfirmationRequest, ConfirmationState, ImageFile, Message, MessageId,
    Sender, SessionId, StreamEvent, derive_title,
};
use nurture_domain::core::string::truncate_chars;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Errors of controller commands.
///
/// Sending never fails with an error: refusals and failed exchanges are
/// reported as [`SendOutcome`] values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Confirmation error: {0}")]
    Confirmation(#[from] ConfirmationError),

    #[error("Session error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("No follow-up question #{0}")]
    NoSuchFollowUp(usize),
}

/// How a send ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Nothing was sent; the conversation is unchanged.
    Rejected(SendRejection),
    /// The answer arrived and replaced the placeholder.
    Completed {
        message_id: MessageId,
        confirmation: Option<ConfirmationRequest>,
    },
    /// The exchange failed; the placeholder now holds the fallback text.
    Failed { message_id: MessageId, error: String },
}

impl SendOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SendOutcome::Rejected(_))
    }
}

/// Facade over one chat session.
pub struct ChatController {
    transport: Arc<dyn ChatTransport>,
    confirmations: Arc<dyn ConfirmationGateway>,
    sessions: Arc<dyn SessionGateway>,
    config: ChatConfig,
    state: SessionState,
    dispatcher: StreamingDispatcher,
    confirmation: ConfirmationHandler,
    follow_ups: FollowUpHandler,
    attachments: AttachmentPipeline,
    progress: Arc<dyn ChatProgressNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
    events: Option<mpsc::UnboundedSender<ChatEvent>>,
}

impl ChatController {
    pub fn new(
        config: ChatConfig,
        transport: Arc<dyn ChatTransport>,
        confirmations: Arc<dyn ConfirmationGateway>,
        sessions: Arc<dyn SessionGateway>,
        image_processor: Arc<dyn ImageProcessor>,
        uploader: Arc<dyn AttachmentUploader>,
    ) -> Self {
        let dispatcher = StreamingDispatcher::new(DispatchSettings {
            user_id: config.user_id.clone(),
            family_info: config.family_info.clone(),
            embed_routing_directive: config.embed_routing_directive,
        });
        let attachments =
            AttachmentPipeline::new(image_processor, uploader, config.attachments.clone());
        Self {
            transport,
            confirmations,
            sessions,
            state: SessionState::new(Some(config.seed_message())),
            config,
            dispatcher,
            confirmation: ConfirmationHandler::new(),
            follow_ups: FollowUpHandler::new(),
            attachments,
            progress: Arc::new(NoChatProgress),
            conversation_logger: Arc::new(NoConversationLogger),
            events: None,
        }
    }

    /// Render streaming progress through `progress`.
    pub fn with_progress(mut self, progress: Arc<dyn ChatProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Emit [`ChatEvent`]s to `tx`.
    pub fn with_event_sink(mut self, tx: mpsc::UnboundedSender<ChatEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.state.session_id()
    }

    pub fn confirmation_state(&self) -> &ConfirmationState {
        self.confirmation.state()
    }

    pub fn pending_confirmation(&self) -> Option<&ConfirmationRequest> {
        self.confirmation.pending()
    }

    /// Whether the pending confirmation's advisory timeout has passed.
    pub fn confirmation_expired(&self) -> bool {
        self.confirmation.is_expired(chrono::Utc::now())
    }

    pub fn follow_up_questions(&self) -> &[String] {
        self.follow_ups.questions()
    }

    pub fn attachment(&self) -> &AttachmentState {
        self.attachments.attachment()
    }

    pub fn web_search_enabled(&self) -> bool {
        self.attachments.web_search_enabled()
    }

    /// Whether a send would be refused right now, and why.
    pub fn input_blocked(&self) -> Option<SendRejection> {
        if self.confirmation.blocks_input() {
            Some(SendRejection::AwaitingConfirmation)
        } else if self.state.is_streaming() {
            Some(SendRejection::InFlight)
        } else {
            None
        }
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    // ==================== Sending ====================

    /// Send `text` (plus the current attachment or web-search mode) and wait
    /// for the answer.
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        match self.begin_send(text).await {
            Ok(dispatch) => self.run_exchange(dispatch).await,
            Err(rejection) => SendOutcome::Rejected(rejection),
        }
    }

    /// First half of a send: validate, upload the attachment, append the user
    /// message and the placeholder.
    ///
    /// The attachment is consumed once the message goes out.
    pub async fn begin_send(&mut self, text: &str) -> Result<Dispatch, SendRejection> {
        let has_attachment = self.attachments.composer().has_attachment();
        let mut request = SendRequest::text(text).with_web_search(self.web_search_enabled());
        if has_attachment {
            request = request.with_image(OutgoingImage {
                path: None,
                description: self.config.messages.image_description.clone(),
            });
        }

        if let Err(rejection) =
            self.dispatcher
                .check(&self.state, &request, self.confirmation.blocks_input())
        {
            info!("Send rejected: {}", rejection);
            self.emit(ChatEvent::SendRejected(rejection));
            return Err(rejection);
        }

        if let Some(image) = request.image.as_mut() {
            if let Some(file) = self.attachments.attachment().file() {
                self.progress.on_upload_start(&file.name);
            }
            image.path = self
                .attachments
                .resolve_remote_path(&self.config.user_id)
                .await;
        }

        let dispatch =
            match self
                .dispatcher
                .begin(&mut self.state, request, self.confirmation.blocks_input())
            {
                Ok(dispatch) => dispatch,
                Err(rejection) => {
                    self.emit(ChatEvent::SendRejected(rejection));
                    return Err(rejection);
                }
            };

        if has_attachment {
            self.attachments.clear();
            self.emit(ChatEvent::AttachmentCleared);
        }
        for id in [dispatch.user_message, dispatch.ticket.message_id] {
            if let Some(message) = self.state.message(id) {
                self.emit(ChatEvent::MessageAppended(message.clone()));
            }
        }
        self.progress
            .on_stream_start(dispatch.ticket.message_id, &dispatch.envelope);
        self.conversation_logger.log(ConversationEvent::new(
            "chat_request",
            json!({
                "message": dispatch.envelope.literal_text(),
                "session_id": dispatch.envelope.session_id,
                "web_search": dispatch.envelope.web_search_enabled,
                "has_image": dispatch.envelope.has_image,
                "image_path": dispatch.envelope.image_path.as_deref().map(|p| truncate_chars(p, 120)),
                "routing_hint": dispatch.envelope.routing_hint,
            }),
        ));
        Ok(dispatch)
    }

    /// Second half of a send: apply one stream event.
    ///
    /// Returns the outcome for a terminal event that still belongs to the
    /// current exchange; `None` for deltas and for stale or duplicate events.
    pub fn apply_stream_event(
        &mut self,
        ticket: DispatchTicket,
        event: StreamEvent,
    ) -> Option<SendOutcome> {
        match event {
            StreamEvent::Delta(chunk) => {
                if self.state.is_current(ticket) {
                    self.progress.on_stream_chunk(&chunk);
                }
                None
            }
            StreamEvent::Completed(response) => {
                let completion = self.dispatcher.complete(&mut self.state, ticket, &response)?;
                self.progress.on_stream_end(completion.message_id, true);

                if let Some(message) = self.state.message(completion.message_id) {
                    self.conversation_logger.log(ConversationEvent::new(
                        "chat_response",
                        json!({
                            "message_id": message.id,
                            "text": message.content(),
                            "confirmation_id": completion
                                .confirmation
                                .as_ref()
                                .map(|c| c.confirmation_id.as_str()),
                            "follow_up_questions": completion.follow_ups,
                        }),
                    ));
                    self.emit(ChatEvent::MessageReplaced(message.clone()));
                }

                self.follow_ups.set(completion.follow_ups.clone());
                self.emit(ChatEvent::FollowUpsUpdated(completion.follow_ups));

                if let Some(request) = &completion.confirmation {
                    self.confirmation
                        .on_response(request.clone(), completion.message_id);
                    self.emit(ChatEvent::ConfirmationRequested(request.clone()));
                }

                Some(SendOutcome::Completed {
                    message_id: completion.message_id,
                    confirmation: completion.confirmation,
                })
            }
            StreamEvent::Error(error) => self.fail_exchange(ticket, error),
        }
    }

    /// Drive an exchange to its terminal event, then save.
    async fn run_exchange(&mut self, dispatch: Dispatch) -> SendOutcome {
        let ticket = dispatch.ticket;
        let outcome = match self.transport.open_stream(&dispatch.envelope).await {
            Ok(mut handle) => loop {
                match handle.next_event().await {
                    Some(event) => {
                        if let Some(outcome) = self.apply_stream_event(ticket, event) {
                            break Some(outcome);
                        }
                    }
                    None => {
                        break self.fail_exchange(
                            ticket,
                            TransportError::TransportClosed.to_string(),
                        );
                    }
                }
            },
            Err(e) => self.fail_exchange(ticket, e.to_string()),
        };

        let outcome = outcome.unwrap_or_else(|| {
            // Only reachable if the session was reset mid-exchange
            SendOutcome::Failed {
                message_id: ticket.message_id,
                error: "exchange superseded".to_string(),
            }
        });
        self.persist().await;
        outcome
    }

    fn fail_exchange(&mut self, ticket: DispatchTicket, error: String) -> Option<SendOutcome> {
        if !self
            .dispatcher
            .fail(&mut self.state, ticket, &self.config.messages.send_error)
        {
            debug!("Dropping stale error for {}: {}", ticket.message_id, error);
            return None;
        }
        warn!("Chat exchange failed: {}", error);
        self.progress.on_stream_end(ticket.message_id, false);
        self.conversation_logger.log(ConversationEvent::new(
            "chat_error",
            json!({ "message_id": ticket.message_id, "error": error }),
        ));
        if let Some(message) = self.state.message(ticket.message_id) {
            self.emit(ChatEvent::MessageReplaced(message.clone()));
        }
        self.follow_ups.clear();
        self.emit(ChatEvent::FollowUpsUpdated(Vec::new()));
        Some(SendOutcome::Failed {
            message_id: ticket.message_id,
            error,
        })
    }

    // ==================== Follow-ups ====================

    /// Send a suggested question. The list is cleared once it goes out.
    pub async fn click_follow_up(&mut self, question: &str) -> SendOutcome {
        if !self.follow_ups.begin_click() {
            return SendOutcome::Rejected(SendRejection::InFlight);
        }
        match self.begin_send(question).await {
            Ok(dispatch) => {
                self.follow_ups.end_click(true);
                self.emit(ChatEvent::FollowUpsUpdated(Vec::new()));
                self.run_exchange(dispatch).await
            }
            Err(rejection) => {
                self.follow_ups.end_click(false);
                SendOutcome::Rejected(rejection)
            }
        }
    }

    /// Send the suggested question at 1-based `position`.
    pub async fn follow_up_by_index(&mut self, position: usize) -> Result<SendOutcome, ChatError> {
        let question = self
            .follow_ups
            .question(position)
            .ok_or(ChatError::NoSuchFollowUp(position))?
            .to_string();
        Ok(self.click_follow_up(&question).await)
    }

    // ==================== Confirmation ====================

    /// Answer the pending confirmation `confirmation_id` with `choice`.
    ///
    /// Rejected without network traffic when nothing is awaiting or the id
    /// does not match. Once submitted, the state always returns to `None`.
    pub async fn answer_confirmation(
        &mut self,
        confirmation_id: &str,
        choice: &str,
    ) -> Result<AnswerOutcome, ChatError> {
        let answer = self.confirmation.begin_answer(
            &self.state,
            confirmation_id,
            choice,
            &self.config.user_id,
        )?;

        let result = self.confirmations.submit(&answer).await;
        let (outcome, appended) = self
            .confirmation
            .finish(&mut self.state, result, &self.config.messages)
            .ok_or(ChatError::Confirmation(ConfirmationError::NotAwaiting))?;

        self.conversation_logger.log(ConversationEvent::new(
            "confirmation_answer",
            json!({
                "confirmation_id": answer.confirmation_id,
                "user_response": answer.user_response,
                "succeeded": outcome.succeeded(),
            }),
        ));
        for message in appended {
            self.emit(ChatEvent::MessageAppended(message));
        }
        self.emit(ChatEvent::ConfirmationResolved {
            succeeded: outcome.succeeded(),
        });

        self.persist().await;
        Ok(outcome)
    }

    /// Answer whatever confirmation is pending.
    pub async fn answer_pending(&mut self, choice: &str) -> Result<AnswerOutcome, ChatError> {
        let id = self
            .confirmation
            .pending()
            .map(|r| r.confirmation_id.as_str().to_string())
            .ok_or(ChatError::Confirmation(ConfirmationError::NotAwaiting))?;
        self.answer_confirmation(&id, choice).await
    }

    // ==================== Attachment and modes ====================

    pub fn select_image(
        &mut self,
        file: ImageFile,
        input_value: Option<String>,
    ) -> Result<(), ChatError> {
        let web_search_was_on = self.web_search_enabled();
        match self.attachments.select_image(file, input_value) {
            Ok(attachment) => {
                let event = attachment.selected.as_ref().map(|s| ChatEvent::AttachmentSelected {
                    file_name: s.file.name.clone(),
                    width: s.preview.width,
                    height: s.preview.height,
                });
                if let Some(event) = event {
                    self.emit(event);
                }
                if web_search_was_on {
                    self.emit(ChatEvent::WebSearchChanged { enabled: false });
                }
                Ok(())
            }
            Err(e) => {
                warn!("Image rejected: {}", e);
                self.emit(ChatEvent::AttachmentRejected {
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    pub fn clear_attachment(&mut self) {
        self.attachments.clear();
        self.emit(ChatEvent::AttachmentCleared);
    }

    pub fn set_web_search(&mut self, enabled: bool) {
        let had_attachment = self.attachments.composer().has_attachment();
        self.attachments.set_web_search(enabled);
        if enabled && had_attachment {
            self.emit(ChatEvent::AttachmentCleared);
        }
        self.emit(ChatEvent::WebSearchChanged { enabled });
    }

    pub fn toggle_web_search(&mut self) -> bool {
        let enabled = !self.web_search_enabled();
        self.set_web_search(enabled);
        enabled
    }

    // ==================== Sessions ====================

    /// Start a new unsaved conversation. Any in-flight exchange becomes stale.
    pub fn new_session(&mut self) {
        info!("Starting new session");
        self.state.reset(Some(self.config.seed_message()));
        self.confirmation.reset();
        self.follow_ups.clear();
        self.attachments.clear();
        self.attachments.set_web_search(false);
        self.emit(ChatEvent::SessionReset);
    }

    /// Replace the local conversation with a stored one.
    ///
    /// Confirmations are never resumed; the loaded session starts unlocked.
    pub async fn load_session(&mut self, id: &SessionId) -> Result<(), ChatError> {
        let session = self.sessions.load_session(id).await?;
        info!(
            "Loaded session {} ({} messages)",
            session.id,
            session.messages.len()
        );
        let title = session.title.clone();
        self.state.load(session);
        self.confirmation.reset();

        let follow_ups = self
            .state
            .messages()
            .last()
            .filter(|m| m.sender == Sender::Assistant)
            .map(|m| m.follow_up_questions.clone())
            .unwrap_or_default();
        self.follow_ups.set(follow_ups.clone());

        self.emit(ChatEvent::SessionLoaded {
            id: id.clone(),
            title,
        });
        self.emit(ChatEvent::FollowUpsUpdated(follow_ups));
        Ok(())
    }

    /// Save the conversation: create on first save, update afterwards.
    ///
    /// Failures are logged and reported as [`ChatEvent::SessionSaveFailed`];
    /// the conversation continues unsaved. Returns whether the save succeeded.
    pub async fn persist(&mut self) -> bool {
        if !self.state.has_user_messages() {
            return false;
        }
        match self.save().await {
            Ok(id) => {
                self.emit(ChatEvent::SessionSaved(id));
                true
            }
            Err(e) => {
                warn!("Failed to save session: {}", e);
                self.emit(ChatEvent::SessionSaveFailed {
                    error: e.to_string(),
                });
                false
            }
        }
    }

    async fn save(&mut self) -> Result<SessionId, PersistenceError> {
        match self.state.session_id().cloned() {
            Some(id) => {
                self.sessions
                    .update_session(&id, self.state.messages())
                    .await?;
                debug!("Session {} updated", id);
                Ok(id)
            }
            None => {
                let title = derive_title(self.state.messages(), &self.config.messages.default_title);
                let session = self
                    .sessions
                    .create_session(&title, self.state.messages())
                    .await?;
                info!("Session created: {} ({})", session.id, session.title);
                self.state.set_session_id(session.id.clone());
                self.state.set_title(session.title);
                Ok(session.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttachmentLimits;
    use crate::ports::attachment_uploader::UploadError;
    use crate::ports::chat_transport::StreamHandle;
    use crate::ports::image_processor::ImageProcessingError;
    use async_trait::async_trait;
    use nurture_domain::{
        ActionType, ChatResponse, ConfirmationAnswer, ConfirmationReply, FollowupAction,
        ImagePreview, MessageKind, OutgoingEnvelope, RoutingHint, Session, UploadReceipt,
        WEB_SEARCH_DIRECTIVE_HEADER,
    };
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    // ==================== Fakes ====================

    /// Replays one scripted stream per call and records every envelope.
    #[derive(Default)]
    struct ScriptedTransport {
        scripts: Mutex<VecDeque<Result<Vec<StreamEvent>, TransportError>>>,
        envelopes: Mutex<Vec<OutgoingEnvelope>>,
    }

    impl ScriptedTransport {
        fn push(&self, script: Result<Vec<StreamEvent>, TransportError>) {
            self.scripts.lock().unwrap().push_back(script);
        }

        fn answer(&self, text: &str) {
            self.push(Ok(vec![
                StreamEvent::Delta(text.to_string()),
                StreamEvent::Completed(ChatResponse::from_text(text)),
            ]));
        }

        fn envelopes(&self) -> Vec<OutgoingEnvelope> {
            self.envelopes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn open_stream(
            &self,
            envelope: &OutgoingEnvelope,
        ) -> Result<StreamHandle, TransportError> {
            self.envelopes.lock().unwrap().push(envelope.clone());
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::ConnectionError("no script".into())));
            script.map(StreamHandle::from_events)
        }
    }

    #[derive(Default)]
    struct FakeConfirmations {
        reply: Mutex<Option<Result<ConfirmationReply, ConfirmationError>>>,
        answers: Mutex<Vec<ConfirmationAnswer>>,
    }

    #[async_trait]
    impl ConfirmationGateway for FakeConfirmations {
        async fn submit(
            &self,
            answer: &ConfirmationAnswer,
        ) -> Result<ConfirmationReply, ConfirmationError> {
            self.answers.lock().unwrap().push(answer.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ConfirmationError::RequestFailed("no reply".into())))
        }
    }

    #[derive(Default)]
    struct FakeSessions {
        stored: Mutex<HashMap<String, Session>>,
        creates: Mutex<usize>,
        updates: Mutex<usize>,
        unavailable: Mutex<bool>,
    }

    impl FakeSessions {
        fn check(&self) -> Result<(), PersistenceError> {
            if *self.unavailable.lock().unwrap() {
                return Err(PersistenceError::Unavailable("down".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl SessionGateway for FakeSessions {
        async fn create_session(
            &self,
            title: &str,
            messages: &[Message],
        ) -> Result<Session, PersistenceError> {
            self.check()?;
            let mut creates = self.creates.lock().unwrap();
            *creates += 1;
            let id = SessionId::new(format!("s-{}", *creates)).unwrap();
            let session = Session::new(id.clone(), title, messages.to_vec());
            self.stored
                .lock()
                .unwrap()
                .insert(id.as_str().to_string(), session.clone());
            Ok(session)
        }

        async fn update_session(
            &self,
            id: &SessionId,
            messages: &[Message],
        ) -> Result<(), PersistenceError> {
            self.check()?;
            *self.updates.lock().unwrap() += 1;
            let mut stored = self.stored.lock().unwrap();
            let session = stored
                .get_mut(id.as_str())
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
            session.messages = messages.to_vec();
            Ok(())
        }

        async fn load_session(&self, id: &SessionId) -> Result<Session, PersistenceError> {
            self.check()?;
            self.stored
                .lock()
                .unwrap()
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
        }
    }

    struct FakeProcessor;

    impl ImageProcessor for FakeProcessor {
        fn prepare_preview(
            &self,
            file: &ImageFile,
            _limits: &AttachmentLimits,
        ) -> Result<ImagePreview, ImageProcessingError> {
            Ok(ImagePreview {
                data_url: format!("data:image/jpeg;base64,{}", file.name),
                mime_type: "image/jpeg".to_string(),
                width: 640,
                height: 480,
            })
        }
    }

    struct FakeUploader {
        result: Result<UploadReceipt, UploadError>,
    }

    #[async_trait]
    impl AttachmentUploader for FakeUploader {
        async fn upload(
            &self,
            _file: &ImageFile,
            _user_id: &str,
        ) -> Result<UploadReceipt, UploadError> {
            self.result.clone()
        }
    }

    struct Harness {
        transport: Arc<ScriptedTransport>,
        confirmations: Arc<FakeConfirmations>,
        sessions: Arc<FakeSessions>,
        controller: ChatController,
        events: mpsc::UnboundedReceiver<ChatEvent>,
    }

    impl Harness {
        fn drain(&mut self) -> Vec<ChatEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }
    }

    fn harness_with_upload(upload: Result<UploadReceipt, UploadError>) -> Harness {
        let transport = Arc::new(ScriptedTransport::default());
        let confirmations = Arc::new(FakeConfirmations::default());
        let sessions = Arc::new(FakeSessions::default());
        let (tx, events) = mpsc::unbounded_channel();
        let controller = ChatController::new(
            ChatConfig::new("u1").with_family_info(json!({"child_age_months": 8})),
            transport.clone(),
            confirmations.clone(),
            sessions.clone(),
            Arc::new(FakeProcessor),
            Arc::new(FakeUploader { result: upload }),
        )
        .with_event_sink(tx);
        Harness {
            transport,
            confirmations,
            sessions,
            controller,
            events,
        }
    }

    fn harness() -> Harness {
        harness_with_upload(Ok(UploadReceipt {
            success: true,
            file_url: Some("https://api.example.com/uploads/u1/photo-123.jpg".to_string()),
        }))
    }

    fn photo() -> ImageFile {
        ImageFile::new("photo.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    fn confirmation_payload() -> serde_json::Value {
        json!({
            "confirmation_id": "c-1",
            "question": "睡眠記録を保存しますか？",
            "options": ["はい", "いいえ"],
            "context_data": {"record_type": "sleep", "minutes": 90},
        })
    }

    // ==================== Scenarios ====================

    #[tokio::test]
    async fn test_plain_send_keeps_literal_text() {
        let mut h = harness();
        h.transport.answer("大変ですね。");
        let outcome = h.controller.send("夜泣きがひどくて困っています").await;

        assert!(matches!(outcome, SendOutcome::Completed { confirmation: None, .. }));
        let envelope = &h.transport.envelopes()[0];
        assert_eq!(envelope.message, "夜泣きがひどくて困っています");
        assert!(envelope.routing_hint.is_none());
        assert!(envelope.conversation_history.is_empty());
        assert_eq!(envelope.family_info, json!({"child_age_months": 8}));

        // seed + user + answer
        let messages = h.controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content(), "夜泣きがひどくて困っています");
        assert_eq!(messages[2].content(), "大変ですね。");
        assert_eq!(h.controller.state().streaming_count(), 0);
    }

    #[tokio::test]
    async fn test_begin_send_appends_user_and_placeholder() {
        let mut h = harness();
        let dispatch = h
            .controller
            .begin_send("夜泣きがひどくて困っています")
            .await
            .unwrap();

        let messages = h.controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[2].kind(), MessageKind::Streaming);
        assert_eq!(dispatch.envelope.message, "夜泣きがひどくて困っています");

        let events = h.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], ChatEvent::MessageAppended(ref m) if m.is_streaming()));
    }

    #[tokio::test]
    async fn test_web_search_send_wraps_directive() {
        let mut h = harness();
        h.transport.answer("検索結果です");
        h.controller.set_web_search(true);
        h.controller.send("近くの病院").await;

        let envelope = &h.transport.envelopes()[0];
        assert!(envelope.message.starts_with(WEB_SEARCH_DIRECTIVE_HEADER));
        assert!(envelope.message.contains("近くの病院"));
        assert!(envelope.web_search_enabled);
        assert_eq!(envelope.routing_hint, Some(RoutingHint::WebSearch));
    }

    #[tokio::test]
    async fn test_confirmation_round_trip() {
        let mut h = harness();
        h.transport.push(Ok(vec![StreamEvent::Completed(
            ChatResponse::from_text("保存しますか？").with_confirmation(confirmation_payload()),
        )]));
        let outcome = h.controller.send("90分寝ました").await;
        assert!(matches!(outcome, SendOutcome::Completed { confirmation: Some(_), .. }));
        assert_eq!(h.controller.confirmation_state().label(), "awaiting");

        // Input is locked while awaiting
        let before = h.controller.messages().len();
        assert_eq!(
            h.controller.send("別の質問").await,
            SendOutcome::Rejected(SendRejection::AwaitingConfirmation)
        );
        assert_eq!(h.controller.messages().len(), before);

        *h.confirmations.reply.lock().unwrap() = Some(Ok(ConfirmationReply {
            message: "保存しました".to_string(),
            followup_action: Some(FollowupAction::cancel()),
        }));
        let outcome = h
            .controller
            .answer_confirmation("c-1", "はい")
            .await
            .unwrap();

        assert_eq!(outcome.action_type(), Some(&ActionType::Cancel));
        let answers = h.confirmations.answers.lock().unwrap().clone();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].user_response, "はい");
        assert_eq!(
            answers[0].response_metadata.context_data,
            json!({"record_type": "sleep", "minutes": 90})
        );
        // Saved after the first exchange, so the answer carries the session id
        assert_eq!(answers[0].session_id.as_ref().unwrap().as_str(), "s-1");

        assert_eq!(h.controller.messages().len(), before + 1);
        assert_eq!(h.controller.messages().last().unwrap().content(), "保存しました");
        assert!(h.controller.confirmation_state().is_none());
        assert!(h.controller.input_blocked().is_none());
    }

    #[tokio::test]
    async fn test_proceed_appends_continuation_note() {
        let mut h = harness();
        h.transport.push(Ok(vec![StreamEvent::Completed(
            ChatResponse::from_text("保存しますか？").with_confirmation(confirmation_payload()),
        )]));
        h.controller.send("90分寝ました").await;
        *h.confirmations.reply.lock().unwrap() = Some(Ok(ConfirmationReply {
            message: "保存しました".to_string(),
            followup_action: Some(FollowupAction::proceed()),
        }));
        let before = h.controller.messages().len();
        h.controller.answer_pending("はい").await.unwrap();
        assert_eq!(h.controller.messages().len(), before + 2);
        assert_eq!(
            h.controller.messages().last().unwrap().content(),
            h.controller.config().messages.proceed_note
        );
    }

    #[tokio::test]
    async fn test_confirmation_failure_unlocks_input() {
        let mut h = harness();
        h.transport.push(Ok(vec![StreamEvent::Completed(
            ChatResponse::from_text("保存しますか？").with_confirmation(confirmation_payload()),
        )]));
        h.controller.send("90分寝ました").await;

        let outcome = h.controller.answer_pending("はい").await.unwrap();
        assert!(!outcome.succeeded());
        assert_eq!(
            h.controller.messages().last().unwrap().content(),
            h.controller.config().messages.confirmation_error
        );
        assert!(h.controller.confirmation_state().is_none());

        h.transport.answer("どうぞ");
        assert!(!h.controller.send("次の質問").await.is_rejected());
    }

    #[tokio::test]
    async fn test_answer_rejections_send_nothing() {
        let mut h = harness();
        assert_eq!(
            h.controller.answer_confirmation("c-1", "はい").await,
            Err(ChatError::Confirmation(ConfirmationError::NotAwaiting))
        );

        h.transport.push(Ok(vec![StreamEvent::Completed(
            ChatResponse::from_text("保存しますか？").with_confirmation(confirmation_payload()),
        )]));
        h.controller.send("90分寝ました").await;
        assert_eq!(
            h.controller.answer_confirmation("c-other", "はい").await,
            Err(ChatError::Confirmation(ConfirmationError::UnknownConfirmation(
                "c-other".to_string()
            )))
        );
        assert!(h.confirmations.answers.lock().unwrap().is_empty());
        assert_eq!(h.controller.confirmation_state().label(), "awaiting");
    }

    #[tokio::test]
    async fn test_transport_error_leaves_one_fallback() {
        let mut h = harness();
        h.transport
            .push(Err(TransportError::HttpStatus { status: 502, message: "bad gateway".into() }));
        let outcome = h.controller.send("熱があります").await;

        let SendOutcome::Failed { message_id, .. } = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        let messages = h.controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].id, message_id);
        assert_eq!(messages[2].kind(), MessageKind::Text);
        assert_eq!(messages[2].content(), h.controller.config().messages.send_error);
        assert!(!h.controller.state().is_streaming());

        h.transport.answer("大丈夫ですか");
        assert!(matches!(
            h.controller.send("熱があります").await,
            SendOutcome::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn test_stream_error_event_and_closed_stream_fail() {
        let mut h = harness();
        h.transport
            .push(Ok(vec![StreamEvent::Delta("途中".into()), StreamEvent::Error("boom".into())]));
        assert!(matches!(h.controller.send("a").await, SendOutcome::Failed { .. }));

        h.transport.push(Ok(vec![StreamEvent::Delta("途中".into())]));
        let outcome = h.controller.send("b").await;
        assert!(matches!(outcome, SendOutcome::Failed { ref error, .. } if error == "Transport closed"));
        assert_eq!(h.controller.state().streaming_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_sends_preview_path() {
        let mut h = harness_with_upload(Err(UploadError::RequestFailed("timeout".into())));
        h.transport.answer("かわいいですね");
        h.controller.select_image(photo(), None).unwrap();
        h.controller.send("この発疹は大丈夫？").await;

        let envelope = &h.transport.envelopes()[0];
        assert_eq!(
            envelope.image_path.as_deref(),
            Some("data:image/jpeg;base64,photo.jpg")
        );
        assert!(envelope.has_image);
        assert_eq!(envelope.routing_hint, Some(RoutingHint::ImageAnalysis));
        assert!(h.controller.attachment().is_empty());
        assert_eq!(h.controller.messages()[1].kind(), MessageKind::Image);
    }

    #[tokio::test]
    async fn test_uploaded_image_uses_server_path() {
        let mut h = harness();
        h.transport.answer("確認しました");
        h.controller.select_image(photo(), None).unwrap();
        h.controller.send("").await;
        assert_eq!(
            h.transport.envelopes()[0].image_path.as_deref(),
            Some("/app/uploads/images/photo-123.jpg")
        );
    }

    // ==================== Invariants ====================

    #[tokio::test]
    async fn test_second_send_while_streaming_is_rejected() {
        let mut h = harness();
        h.controller.begin_send("一つ目").await.unwrap();
        let before = h.controller.messages().to_vec();

        assert_eq!(
            h.controller.send("二つ目").await,
            SendOutcome::Rejected(SendRejection::InFlight)
        );
        assert_eq!(h.controller.messages(), before.as_slice());
        assert_eq!(h.controller.state().streaming_count(), 1);
        assert!(h.transport.envelopes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_send_is_rejected() {
        let mut h = harness();
        assert_eq!(
            h.controller.send("   ").await,
            SendOutcome::Rejected(SendRejection::Empty)
        );
        assert_eq!(h.controller.messages().len(), 1);
        assert!(h.drain().contains(&ChatEvent::SendRejected(SendRejection::Empty)));
    }

    #[tokio::test]
    async fn test_stale_completion_is_dropped() {
        let mut h = harness();
        let dispatch = h.controller.begin_send("質問").await.unwrap();
        let ticket = dispatch.ticket;

        let first = h
            .controller
            .apply_stream_event(ticket, StreamEvent::Completed(ChatResponse::from_text("回答")));
        assert!(first.is_some());
        let snapshot = h.controller.messages().to_vec();

        assert!(h
            .controller
            .apply_stream_event(ticket, StreamEvent::Completed(ChatResponse::from_text("重複")))
            .is_none());
        assert!(h
            .controller
            .apply_stream_event(ticket, StreamEvent::Error("late".into()))
            .is_none());
        assert_eq!(h.controller.messages(), snapshot.as_slice());
    }

    #[tokio::test]
    async fn test_completion_after_new_session_is_dropped() {
        let mut h = harness();
        let dispatch = h.controller.begin_send("質問").await.unwrap();
        h.controller.new_session();

        assert!(h
            .controller
            .apply_stream_event(
                dispatch.ticket,
                StreamEvent::Completed(ChatResponse::from_text("遅い回答"))
            )
            .is_none());
        assert_eq!(h.controller.messages().len(), 1);
        assert!(h.controller.messages()[0].is_seed);
    }

    #[test]
    fn test_web_search_and_attachment_are_exclusive() {
        let mut h = harness();
        h.controller.set_web_search(true);
        h.controller.select_image(photo(), Some("/tmp/photo.jpg".into())).unwrap();
        assert!(!h.controller.web_search_enabled());
        assert!(!h.controller.attachment().is_empty());

        assert!(h.controller.toggle_web_search());
        assert!(h.controller.attachment().is_empty());

        let events = h.drain();
        assert!(events.contains(&ChatEvent::WebSearchChanged { enabled: false }));
        assert!(events.contains(&ChatEvent::AttachmentCleared));
    }

    #[test]
    fn test_non_image_selection_is_rejected() {
        let mut h = harness();
        let err = h
            .controller
            .select_image(ImageFile::new("memo.txt", "text/plain", b"hi".to_vec()), None)
            .unwrap_err();
        assert!(matches!(err, ChatError::Attachment(_)));
        assert!(h.controller.attachment().is_empty());
        assert!(matches!(
            h.drain().last(),
            Some(ChatEvent::AttachmentRejected { .. })
        ));
    }

    #[test]
    fn test_clear_attachment_round_trip() {
        let mut h = harness();
        h.controller.select_image(photo(), Some("/tmp/photo.jpg".into())).unwrap();
        h.controller.clear_attachment();
        assert_eq!(h.controller.attachment(), &AttachmentState::default());
    }

    // ==================== Follow-ups ====================

    #[tokio::test]
    async fn test_follow_ups_replaced_on_completion_and_cleared_on_error() {
        let mut h = harness();
        h.transport.push(Ok(vec![StreamEvent::Completed(
            ChatResponse::from_text("回答").with_follow_ups(&["寝る前の習慣は？", "昼寝の長さは？"]),
        )]));
        h.controller.send("寝ない").await;
        assert_eq!(h.controller.follow_up_questions().len(), 2);

        h.transport.push(Err(TransportError::Timeout));
        h.controller.send("もう一度").await;
        assert!(h.controller.follow_up_questions().is_empty());
    }

    #[tokio::test]
    async fn test_follow_up_by_index_sends_question() {
        let mut h = harness();
        h.transport.push(Ok(vec![StreamEvent::Completed(
            ChatResponse::from_text("回答").with_follow_ups(&["寝る前の習慣は？"]),
        )]));
        h.controller.send("寝ない").await;

        h.transport.answer("習慣についてです");
        let outcome = h.controller.follow_up_by_index(1).await.unwrap();
        assert!(matches!(outcome, SendOutcome::Completed { .. }));
        assert_eq!(h.transport.envelopes()[1].message, "寝る前の習慣は？");
        assert!(h.controller.follow_up_questions().is_empty());

        assert_eq!(
            h.controller.follow_up_by_index(3).await,
            Err(ChatError::NoSuchFollowUp(3))
        );
    }

    #[tokio::test]
    async fn test_follow_ups_extracted_from_text() {
        let mut h = harness();
        h.transport.push(Ok(vec![StreamEvent::Completed(ChatResponse::from_text(
            "回答です。\n\n## 次に聞いてみませんか\n- 授乳の間隔は？\n- 夜間断乳の時期は？",
        ))]));
        h.controller.send("授乳").await;
        assert_eq!(
            h.controller.follow_up_questions(),
            ["授乳の間隔は？".to_string(), "夜間断乳の時期は？".to_string()]
        );
        assert_eq!(h.controller.messages().last().unwrap().content(), "回答です。");
    }

    // ==================== Sessions ====================

    #[tokio::test]
    async fn test_persist_creates_then_updates() {
        let mut h = harness();
        h.transport.answer("一");
        h.controller.send("一つ目の相談です").await;
        assert_eq!(h.controller.session_id().unwrap().as_str(), "s-1");
        assert_eq!(h.controller.state().title(), Some("一つ目の相談です"));

        h.transport.answer("二");
        h.controller.send("二つ目").await;
        assert_eq!(*h.sessions.creates.lock().unwrap(), 1);
        assert_eq!(*h.sessions.updates.lock().unwrap(), 1);
        assert_eq!(
            h.transport.envelopes()[1].session_id.as_ref().unwrap().as_str(),
            "s-1"
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_is_not_fatal() {
        let mut h = harness();
        *h.sessions.unavailable.lock().unwrap() = true;
        h.transport.answer("回答");
        let outcome = h.controller.send("質問").await;
        assert!(matches!(outcome, SendOutcome::Completed { .. }));
        assert!(h.controller.session_id().is_none());
        assert!(h
            .drain()
            .iter()
            .any(|e| matches!(e, ChatEvent::SessionSaveFailed { .. })));
    }

    #[tokio::test]
    async fn test_load_session_replaces_conversation() {
        let mut h = harness();
        h.transport.push(Ok(vec![StreamEvent::Completed(
            ChatResponse::from_text("保存しますか？")
                .with_confirmation(confirmation_payload())
                .with_follow_ups(&["他には？"]),
        )]));
        h.controller.send("保存してほしい").await;
        let id = h.controller.session_id().cloned().unwrap();

        h.controller.new_session();
        assert_eq!(h.controller.messages().len(), 1);
        assert!(h.controller.follow_up_questions().is_empty());

        h.controller.load_session(&id).await.unwrap();
        assert_eq!(h.controller.messages().len(), 3);
        assert_eq!(h.controller.session_id(), Some(&id));
        // Loaded sessions never resume a confirmation
        assert!(h.controller.confirmation_state().is_none());
        assert_eq!(h.controller.follow_up_questions(), ["他には？".to_string()]);

        let missing = SessionId::new("nope").unwrap();
        assert!(matches!(
            h.controller.load_session(&missing).await,
            Err(ChatError::Persistence(PersistenceError::NotFound(_)))
        ));
    }
}
