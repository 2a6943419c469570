//! Mana Tomb: a deck builder for Magic: The Gathering.
//!
//! Users keep decks of cards resolved by name against an external card
//! catalog. Resolved cards are cached locally and shared by every deck.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub mod crypto {
    pub mod csrf;
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod card;
    pub mod deck;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod card;
    pub mod deck;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod cards;
    pub mod catalog;
    pub mod decks;
}

pub mod handlers {
    pub mod account;
    pub mod auth;
    pub mod cards;
    pub mod decks;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
}

pub mod validation {
    pub mod auth;
    pub mod deck;
}
