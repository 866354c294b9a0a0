//! All user-facing message texts in one table, so wording changes and
//! localization never touch control flow.

/// Named prompt texts. `first_option` is a template; substitute the poll
/// title with [`Prompts::first_option`].
#[derive(Debug, Clone, Copy)]
pub struct Prompts {
    pub new_poll: &'static str,
    pub premature_done: &'static str,
    first_option_template: &'static str,
    pub next_option: &'static str,
    pub help: &'static str,
    pub done: &'static str,
    pub over_quota: &'static str,
    pub invalid_data: &'static str,
    pub deleted: &'static str,
    pub results_updated: &'static str,
    pub may_now_vote: &'static str,
    pub poll_deleted: &'static str,
    pub polls_header: &'static str,
    pub polls_footer: &'static str,
    pub create_new_poll: &'static str,
}

impl Prompts {
    pub fn first_option(&self, bold_title: &str) -> String {
        self.first_option_template.replace("{title}", bold_title)
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            new_poll: "Let's create a new poll. First, send me the title.",
            premature_done: "Sorry, a poll needs to have at least one option to work.",
            first_option_template: "New poll: '{title}'\n\nPlease send me the first answer option.",
            next_option: "Good. Now send me another answer option, or /done to finish.",
            help: "This bot will help you create polls where people can leave their names. \
                   Use /start to create a poll here, then publish it to groups or send it to \
                   individual friends.\n\nSend /polls to manage your existing polls.",
            done: "\u{1f44d} Poll created. You can now publish it to a group or send it to \
                   your friends in a private message. To do this, tap the button below or start \
                   your message in any other chat with @countmeinbot and select one of your polls to send.",
            over_quota: "Sorry, CountMeIn Bot is overloaded right now. Please try again later!",
            invalid_data: "Invalid data. This attempt will be logged!",
            deleted: "Sorry, this poll has been deleted",
            results_updated: "Results updated!",
            may_now_vote: "You may now vote!",
            poll_deleted: "Poll deleted!",
            polls_header: "Your polls",
            polls_footer: "Use /start to create a new poll.",
            create_new_poll: "Create new poll",
        }
    }
}
