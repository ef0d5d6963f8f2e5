use loadgrid::entry;
use loadgrid::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
