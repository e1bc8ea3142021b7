use crate::error::ShipwrightError;
use crate::messages::MessageRepository;
use crate::projects::ProjectRepository;
use crate::reviews::ReviewRepository;
use crate::settings::SettingsRepository;

pub trait Store {
    type Projects<'a>: ProjectRepository
    where
        Self: 'a;
    type Reviews<'a>: ReviewRepository
    where
        Self: 'a;
    type Messages<'a>: MessageRepository
    where
        Self: 'a;
    type Settings<'a>: SettingsRepository
    where
        Self: 'a;

    fn projects(&self) -> Self::Projects<'_>;
    fn reviews(&self) -> Self::Reviews<'_>;
    fn messages(&self) -> Self::Messages<'_>;
    fn settings(&self) -> Self::Settings<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, ShipwrightError>
    where
        F: FnOnce(&Self) -> Result<T, ShipwrightError>;
}
