mod http_media_fetcher;
mod twilio_messenger;

pub use http_media_fetcher::HttpMediaFetcher;
pub use twilio_messenger::TwilioMessenger;
